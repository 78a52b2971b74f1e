//! Visits embedded in a client record
//!
//! A visit is a denormalised copy of one billing transaction. When it
//! carries a `bill_id`, the bill ledger is authoritative and the copy here
//! is a cache that may drift.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::service_line::validate_services;
use core_kernel::{BillId, BillNumber, PaymentStatus, ServiceLine, ServiceLineInput, VisitId};

use crate::error::ClientError;

/// One visit in a client's ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visit {
    pub visit_id: VisitId,
    pub date: DateTime<Utc>,
    pub services: Vec<ServiceLine>,
    pub bill_number: Option<BillNumber>,
    pub bill_id: Option<BillId>,
    pub subtotal: Option<Decimal>,
    pub discount: Decimal,
    pub gst_amount: Option<Decimal>,
    pub final_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub notes: String,
    pub specialist: String,
}

/// Caller-supplied visit data.
///
/// Several historical field names exist for the same figures: `totalAmount`,
/// `totalBill` and `totalPrice` all mean the visit total, and `gstAmount`
/// and `gst` both mean the tax amount. [`VisitInput::resolve`] is the only
/// place these are reconciled.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitInput {
    #[serde(default)]
    pub services: Vec<ServiceLineInput>,
    pub total_amount: Option<Decimal>,
    pub total_bill: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub final_amount: Option<Decimal>,
    pub subtotal: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub gst_amount: Option<Decimal>,
    pub gst: Option<Decimal>,
    pub bill_number: Option<String>,
    pub bill_id: Option<BillId>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
    pub specialist: Option<String>,
}

impl VisitInput {
    /// The visit total under whichever alias was supplied
    pub fn resolved_total(&self) -> Option<Decimal> {
        self.total_amount.or(self.total_bill).or(self.total_price)
    }

    /// The GST amount under whichever alias was supplied
    pub fn resolved_gst(&self) -> Option<Decimal> {
        self.gst_amount.or(self.gst)
    }

    /// Resolves aliases and defaults into a new visit dated now.
    ///
    /// The final amount falls back to the total, and both default to zero.
    pub fn resolve(self) -> Result<Visit, ClientError> {
        let total = self.resolved_total();
        let gst_amount = self.resolved_gst();
        let final_amount = self.final_amount.or(total).unwrap_or(Decimal::ZERO);
        let total_amount = total.unwrap_or(final_amount);

        let services = if self.services.is_empty() {
            Vec::new()
        } else {
            validate_services(self.services)?
        };
        let bill_number = self
            .bill_number
            .filter(|n| !n.trim().is_empty())
            .map(|n| n.trim().parse::<BillNumber>())
            .transpose()?;

        Ok(Visit {
            visit_id: VisitId::generate(),
            date: Utc::now(),
            services,
            bill_number,
            bill_id: self.bill_id,
            subtotal: self.subtotal,
            discount: self.discount.unwrap_or(Decimal::ZERO),
            gst_amount,
            final_amount,
            total_amount,
            payment_status: self.payment_status.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            specialist: self.specialist.unwrap_or_default(),
        })
    }
}
