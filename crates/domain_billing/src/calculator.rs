//! Bill amount calculation
//!
//! ```text
//! amount_before_gst = subtotal - discount            (not clamped)
//! gst_amount        = round2(amount_before_gst * rate / 100)
//! final_amount      = round2(amount_before_gst + gst_amount)
//! ```
//!
//! Only `gst_amount` and `final_amount` are rounded.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::service_line::services_total;
use core_kernel::{round2, Percentage, ServiceLine};

/// The derived monetary fields of a bill
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillAmounts {
    pub subtotal: Decimal,
    pub discount: Decimal,
    #[serde(rename = "amountBeforeGST")]
    pub amount_before_gst: Decimal,
    pub gst_percentage: Percentage,
    pub gst_amount: Decimal,
    pub final_amount: Decimal,
}

impl BillAmounts {
    /// Amounts for a caller-supplied subtotal
    pub fn from_subtotal(subtotal: Decimal, discount: Decimal, rate: Percentage) -> Self {
        let amount_before_gst = subtotal - discount;
        let gst_amount = round2(rate.of(amount_before_gst));
        Self {
            subtotal,
            discount,
            amount_before_gst,
            gst_percentage: rate,
            gst_amount,
            final_amount: round2(amount_before_gst + gst_amount),
        }
    }

    /// Amounts with the subtotal summed from the services
    pub fn from_services(services: &[ServiceLine], discount: Decimal, rate: Percentage) -> Self {
        Self::from_subtotal(services_total(services), discount, rate)
    }
}

/// Result of applying GST to a single amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GstCalculation {
    #[serde(rename = "amountBeforeGST")]
    pub amount_before_gst: Decimal,
    pub gst_percentage: Percentage,
    pub gst_amount: Decimal,
    pub final_amount: Decimal,
}

impl GstCalculation {
    pub fn new(amount: Decimal, rate: Percentage) -> Self {
        let amounts = BillAmounts::from_subtotal(amount, Decimal::ZERO, rate);
        Self {
            amount_before_gst: amounts.amount_before_gst,
            gst_percentage: rate,
            gst_amount: amounts.gst_amount,
            final_amount: amounts.final_amount,
        }
    }
}
