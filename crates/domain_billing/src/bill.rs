//! Bill entity, request validation and the payment lifecycle

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::service_line::{services_duration, services_total, validate_services};
use core_kernel::{
    BillId, BillNumber, ClientId, PaymentMethod, PaymentStatus, ServiceLine, ServiceLineInput, StaffId,
};
use domain_client::{BillFacts, VisitInput};

use crate::calculator::BillAmounts;
use crate::error::BillingError;

/// Note recorded when a bill is cancelled without a reason
pub const DEFAULT_CANCEL_NOTE: &str = "Bill cancelled";

/// One billing transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub id: BillId,
    pub bill_number: BillNumber,
    pub client_id: ClientId,
    pub client_name: String,
    pub client_phone: String,
    pub services: Vec<ServiceLine>,
    pub appointment_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub specialist: String,
    pub total_duration: Option<u32>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    #[serde(rename = "amountBeforeGST")]
    pub amount_before_gst: Decimal,
    /// Rate in force when the bill was created
    pub gst_percentage: Decimal,
    pub gst_amount: Decimal,
    /// Pre-tax reference amount, always equal to `subtotal`
    pub total_amount: Decimal,
    pub final_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_by: Option<StaffId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bill {
    /// Builds a bill from a validated request, the resolved client and the
    /// computed amounts
    pub fn new(draft: BillDraft, client_id: ClientId, client_phone: String, amounts: BillAmounts) -> Self {
        let now = Utc::now();
        let total_duration = draft.total_duration.or_else(|| {
            let minutes = services_duration(&draft.services);
            (minutes > 0).then_some(minutes)
        });
        Self {
            id: BillId::new_v7(),
            bill_number: BillNumber::generate(),
            client_id,
            client_name: draft.client_name,
            client_phone,
            services: draft.services,
            appointment_date: draft.appointment_date,
            start_time: draft.start_time,
            specialist: draft.specialist,
            total_duration,
            subtotal: amounts.subtotal,
            discount: amounts.discount,
            amount_before_gst: amounts.amount_before_gst,
            gst_percentage: amounts.gst_percentage.value(),
            gst_amount: amounts.gst_amount,
            total_amount: amounts.subtotal,
            final_amount: amounts.final_amount,
            payment_method: draft.payment_method,
            payment_status: draft.payment_status,
            paid_at: (draft.payment_status == PaymentStatus::Paid).then_some(now),
            notes: draft.notes,
            created_by: draft.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a payment change. Moving to `paid` stamps `paid_at`.
    pub fn apply_payment(&mut self, change: PaymentChange, now: DateTime<Utc>) {
        if let Some(status) = change.payment_status {
            self.payment_status = status;
            if status == PaymentStatus::Paid {
                self.paid_at = Some(now);
            }
        }
        if let Some(method) = change.payment_method {
            self.payment_method = method;
        }
        if let Some(notes) = change.notes {
            self.notes = notes;
        }
        self.updated_at = now;
    }

    /// Marks the bill cancelled and appends the reason to its notes.
    /// Cancelling twice is allowed.
    pub fn cancel(&mut self, reason: Option<&str>, now: DateTime<Utc>) {
        let line = match reason.map(str::trim).filter(|r| !r.is_empty()) {
            Some(reason) => format!("Cancelled: {}", reason),
            None => DEFAULT_CANCEL_NOTE.to_string(),
        };
        self.notes = if self.notes.is_empty() {
            line
        } else {
            format!("{}\n{}", self.notes, line)
        };
        self.payment_status = PaymentStatus::Cancelled;
        self.updated_at = now;
    }

    /// The figures the client ledger treats as authoritative
    pub fn facts(&self) -> BillFacts {
        BillFacts {
            bill_id: self.id,
            bill_number: self.bill_number.clone(),
            services: self.services.clone(),
            subtotal: self.subtotal,
            discount: self.discount,
            amount_before_gst: self.amount_before_gst,
            gst_percentage: self.gst_percentage,
            gst_amount: self.gst_amount,
            final_amount: self.final_amount,
            notes: self.notes.clone(),
            specialist: self.specialist.clone(),
            appointment_date: self.appointment_date,
            start_time: self.start_time.clone(),
            total_duration: self.total_duration,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            created_at: self.created_at,
        }
    }

    /// The visit snapshot appended to the client for this bill. The visit
    /// total is the final, tax-inclusive amount.
    pub fn visit_input(&self) -> VisitInput {
        VisitInput {
            services: self
                .services
                .iter()
                .map(|s| ServiceLineInput {
                    name: Some(s.name.clone()),
                    price: Some(s.price),
                    duration: s.duration,
                    description: s.description.clone(),
                })
                .collect(),
            total_amount: Some(self.final_amount),
            final_amount: Some(self.final_amount),
            subtotal: Some(self.subtotal),
            discount: Some(self.discount),
            gst_amount: Some(self.gst_amount),
            bill_number: Some(self.bill_number.to_string()),
            bill_id: Some(self.id),
            payment_status: Some(self.payment_status),
            notes: Some(self.notes.clone()),
            specialist: Some(self.specialist.clone()),
            ..Default::default()
        }
    }

    pub fn summary(&self) -> BillSummary {
        BillSummary {
            id: self.id,
            bill_number: self.bill_number.clone(),
            client_name: self.client_name.clone(),
            final_amount: self.final_amount,
            payment_status: self.payment_status,
            created_at: self.created_at,
        }
    }

    pub fn printable(&self) -> PrintableBill {
        PrintableBill {
            bill_number: self.bill_number.clone(),
            date: self.appointment_date,
            start_time: self.start_time.clone(),
            specialist: self.specialist.clone(),
            duration: self.total_duration,
            client_name: self.client_name.clone(),
            client_phone: self.client_phone.clone(),
            services: self.services.clone(),
            subtotal: self.subtotal,
            discount: self.discount,
            amount_before_gst: self.amount_before_gst,
            gst_percentage: self.gst_percentage,
            gst_amount: self.gst_amount,
            total: self.final_amount,
            payment_method: self.payment_method,
            payment_status: self.payment_status,
            notes: self.notes.clone(),
            created_at: self.created_at,
        }
    }
}

/// A bill reduced to what listings show
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub id: BillId,
    pub bill_number: BillNumber,
    pub client_name: String,
    pub final_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Flattened print view
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintableBill {
    pub bill_number: BillNumber,
    pub date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub specialist: String,
    pub duration: Option<u32>,
    pub client_name: String,
    pub client_phone: String,
    pub services: Vec<ServiceLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    #[serde(rename = "amountBeforeGST")]
    pub amount_before_gst: Decimal,
    pub gst_percentage: Decimal,
    pub gst_amount: Decimal,
    pub total: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// How the bill's client is identified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientRef {
    /// An existing client, which must exist
    Id(ClientId),
    /// Looked up by phone number and created when missing
    Phone(String),
}

/// A validated bill request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillDraft {
    pub client: ClientRef,
    pub client_name: String,
    pub client_phone: Option<String>,
    pub services: Vec<ServiceLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub notes: String,
    pub specialist: String,
    pub appointment_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub total_duration: Option<u32>,
    pub created_by: Option<StaffId>,
}

/// Body of a bill creation request
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBillRequest {
    pub client_id: Option<ClientId>,
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    #[serde(default)]
    pub services: Vec<ServiceLineInput>,
    pub subtotal: Option<Decimal>,
    pub discount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub notes: Option<String>,
    pub specialist: Option<String>,
    pub appointment_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub total_duration: Option<u32>,
}

impl CreateBillRequest {
    /// Checks required fields. The client is named by id, or by phone
    /// number when it may need to be created.
    pub fn validate(self) -> Result<BillDraft, BillingError> {
        const REQUIRED: &str = "Required fields: clientId, clientName, services, subtotal, paymentMethod";

        let client_name = required_text(self.client_name).ok_or_else(|| BillingError::validation(REQUIRED))?;
        let client_phone = required_text(self.client_phone);
        let client = match (self.client_id, &client_phone) {
            (Some(id), _) => ClientRef::Id(id),
            (None, Some(phone)) => ClientRef::Phone(phone.clone()),
            (None, None) => return Err(BillingError::validation(REQUIRED)),
        };
        let subtotal = self.subtotal.ok_or_else(|| BillingError::validation(REQUIRED))?;
        if subtotal < Decimal::ZERO {
            return Err(BillingError::validation("Subtotal cannot be negative"));
        }
        let payment_method = required_text(self.payment_method)
            .ok_or_else(|| BillingError::validation(REQUIRED))?
            .parse::<PaymentMethod>()?;

        Ok(BillDraft {
            client,
            client_name,
            client_phone,
            services: validate_services(self.services)?,
            subtotal,
            discount: parse_discount(self.discount)?,
            payment_method,
            payment_status: parse_status(self.payment_status.as_deref())?.unwrap_or_default(),
            notes: self.notes.unwrap_or_default(),
            specialist: self.specialist.unwrap_or_default(),
            appointment_date: self.appointment_date,
            start_time: self.start_time,
            total_duration: self.total_duration,
            created_by: None,
        })
    }
}

/// Body of the service-selection flow: the subtotal is summed from the
/// selected services and the bill always starts `pending`
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSelectionRequest {
    pub client_name: Option<String>,
    pub client_phone: Option<String>,
    #[serde(default)]
    pub selected_services: Vec<ServiceLineInput>,
    pub discount: Option<Decimal>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
    pub specialist: Option<String>,
    pub appointment_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub total_duration: Option<u32>,
}

impl ServiceSelectionRequest {
    pub fn validate(self, today: NaiveDate) -> Result<BillDraft, BillingError> {
        const REQUIRED: &str = "Client name, phone number and selected services are required";

        let client_name = required_text(self.client_name).ok_or_else(|| BillingError::validation(REQUIRED))?;
        let client_phone = required_text(self.client_phone).ok_or_else(|| BillingError::validation(REQUIRED))?;
        if self.selected_services.is_empty() {
            return Err(BillingError::validation(REQUIRED));
        }
        let services = validate_services(self.selected_services)?;
        let payment_method = match required_text(self.payment_method) {
            Some(method) => method.parse::<PaymentMethod>()?,
            None => PaymentMethod::default(),
        };

        Ok(BillDraft {
            client: ClientRef::Phone(client_phone.clone()),
            client_name,
            client_phone: Some(client_phone),
            subtotal: services_total(&services),
            services,
            discount: parse_discount(self.discount)?,
            payment_method,
            payment_status: PaymentStatus::Pending,
            notes: self.notes.unwrap_or_default(),
            specialist: self.specialist.unwrap_or_default(),
            appointment_date: Some(self.appointment_date.unwrap_or(today)),
            start_time: self.start_time,
            total_duration: self.total_duration,
            created_by: None,
        })
    }
}

/// Body of a payment update
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentUpdate {
    pub payment_status: Option<String>,
    pub payment_method: Option<String>,
    pub notes: Option<String>,
}

/// A validated payment update
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaymentChange {
    pub payment_status: Option<PaymentStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub notes: Option<String>,
}

impl PaymentUpdate {
    pub fn validate(self) -> Result<PaymentChange, BillingError> {
        let payment_method = required_text(self.payment_method)
            .map(|m| m.parse::<PaymentMethod>())
            .transpose()?;
        Ok(PaymentChange {
            payment_status: parse_status(self.payment_status.as_deref())?,
            payment_method,
            notes: required_text(self.notes),
        })
    }
}

fn required_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_discount(discount: Option<Decimal>) -> Result<Decimal, BillingError> {
    let discount = discount.unwrap_or(Decimal::ZERO);
    if discount < Decimal::ZERO {
        return Err(BillingError::validation("Discount cannot be negative"));
    }
    Ok(discount)
}

pub(crate) fn parse_status(status: Option<&str>) -> Result<Option<PaymentStatus>, BillingError> {
    match status.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<PaymentStatus>().map(Some).map_err(|_| {
            let valid: Vec<&str> = PaymentStatus::ALL.iter().map(|s| s.as_str()).collect();
            BillingError::InvalidStatus(format!("{}. Valid options: {}", raw, valid.join(", ")))
        }),
        None => Ok(None),
    }
}
