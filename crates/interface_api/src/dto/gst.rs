//! GST DTOs

use rust_decimal::Decimal;
use serde::Deserialize;

use domain_billing::{BillingError, GstUpdate};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGstRequest {
    pub gst_percentage: Option<Decimal>,
    pub is_active: Option<bool>,
    pub applied_to: Option<String>,
}

impl UpdateGstRequest {
    pub fn into_update(self) -> Result<GstUpdate, BillingError> {
        GstUpdate::parse(self.gst_percentage, self.is_active, self.applied_to.as_deref())
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CalculateGstRequest {
    pub amount: Option<Decimal>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GstHistoryQuery {
    pub limit: Option<u32>,
}
