//! Client history reconciled against the bill ledger

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BillId, BillNumber, ClientCode, ClientId, PaymentMethod, PaymentStatus, ServiceLine, VisitId};

use crate::client::Client;
use crate::visit::Visit;

/// The authoritative billing figures of one bill, as seen by the client ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillFacts {
    pub bill_id: BillId,
    pub bill_number: BillNumber,
    pub services: Vec<ServiceLine>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub amount_before_gst: Decimal,
    pub gst_percentage: Decimal,
    pub gst_amount: Decimal,
    pub final_amount: Decimal,
    pub notes: String,
    pub specialist: String,
    pub appointment_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub total_duration: Option<u32>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
}

/// Where the figures of a history entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistorySource {
    Bill,
    Snapshot,
}

/// One visit in a client's history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryVisit {
    pub visit_id: VisitId,
    pub date: DateTime<Utc>,
    pub bill_number: Option<BillNumber>,
    pub bill_id: Option<BillId>,
    pub services: Vec<ServiceLine>,
    pub subtotal: Option<Decimal>,
    pub discount: Decimal,
    pub gst_amount: Option<Decimal>,
    pub gst_percentage: Decimal,
    pub final_amount: Decimal,
    pub total_amount: Decimal,
    pub amount_before_gst: Option<Decimal>,
    pub notes: String,
    pub specialist: String,
    pub appointment_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub total_duration: Option<u32>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_status: PaymentStatus,
    pub source: HistorySource,
    /// The embedded snapshot disagrees with the bill on the final amount
    /// or payment status
    pub drifted: bool,
}

impl HistoryVisit {
    /// Builds an entry from the authoritative bill, keeping the visit's own
    /// identity and date
    pub fn from_bill(visit: &Visit, bill: BillFacts) -> Self {
        let drifted = visit.final_amount != bill.final_amount
            || visit.payment_status != bill.payment_status;
        Self {
            visit_id: visit.visit_id.clone(),
            date: visit.date,
            bill_number: visit.bill_number.clone().or(Some(bill.bill_number)),
            bill_id: visit.bill_id,
            services: bill.services,
            subtotal: Some(bill.subtotal),
            discount: bill.discount,
            gst_amount: Some(bill.gst_amount),
            gst_percentage: bill.gst_percentage,
            final_amount: bill.final_amount,
            total_amount: bill.final_amount,
            amount_before_gst: Some(bill.amount_before_gst),
            notes: bill.notes,
            specialist: bill.specialist,
            appointment_date: bill.appointment_date,
            start_time: bill.start_time,
            total_duration: bill.total_duration,
            payment_method: Some(bill.payment_method),
            payment_status: bill.payment_status,
            source: HistorySource::Bill,
            drifted,
        }
    }

    /// Builds an entry from the embedded snapshot alone
    pub fn from_snapshot(visit: &Visit) -> Self {
        Self {
            visit_id: visit.visit_id.clone(),
            date: visit.date,
            bill_number: visit.bill_number.clone(),
            bill_id: visit.bill_id,
            services: visit.services.clone(),
            subtotal: visit.subtotal,
            discount: visit.discount,
            gst_amount: visit.gst_amount,
            gst_percentage: Decimal::ZERO,
            final_amount: visit.final_amount,
            total_amount: visit.total_amount,
            amount_before_gst: None,
            notes: visit.notes.clone(),
            specialist: visit.specialist.clone(),
            appointment_date: None,
            start_time: None,
            total_duration: None,
            payment_method: None,
            payment_status: visit.payment_status,
            source: HistorySource::Snapshot,
            drifted: false,
        }
    }
}

/// A client with reconciled visits, newest first
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientHistory {
    pub id: ClientId,
    pub client_id: ClientCode,
    pub name: String,
    pub phone_number: String,
    pub total_visits: u32,
    pub total_spent: Decimal,
    pub last_visit: Option<DateTime<Utc>>,
    pub visits: Vec<HistoryVisit>,
}

impl ClientHistory {
    pub fn new(client: &Client, mut visits: Vec<HistoryVisit>) -> Self {
        visits.sort_by(|a, b| b.date.cmp(&a.date));
        Self {
            id: client.id,
            client_id: client.client_id.clone(),
            name: client.name.clone(),
            phone_number: client.phone_number.clone(),
            total_visits: client.total_visits,
            total_spent: client.total_spent,
            last_visit: client.last_visit,
            visits,
        }
    }

    /// Number of visits whose snapshot disagrees with its bill
    pub fn drift_count(&self) -> usize {
        self.visits.iter().filter(|v| v.drifted).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visit::VisitInput;
    use rust_decimal_macros::dec;

    fn facts(final_amount: Decimal, status: PaymentStatus) -> BillFacts {
        BillFacts {
            bill_id: BillId::new(),
            bill_number: BillNumber::generate(),
            services: vec![ServiceLine::new("Haircut", dec!(1000)).unwrap()],
            subtotal: dec!(1000),
            discount: Decimal::ZERO,
            amount_before_gst: dec!(1000),
            gst_percentage: dec!(7),
            gst_amount: dec!(70.00),
            final_amount,
            notes: String::new(),
            specialist: "Ayesha".to_string(),
            appointment_date: None,
            start_time: Some("10:30".to_string()),
            total_duration: Some(30),
            payment_method: PaymentMethod::Card,
            payment_status: status,
            created_at: Utc::now(),
        }
    }

    fn snapshot(final_amount: Decimal) -> Visit {
        VisitInput {
            final_amount: Some(final_amount),
            total_amount: Some(final_amount),
            ..Default::default()
        }
        .resolve()
        .unwrap()
    }

    #[test]
    fn test_bill_fields_win() {
        let visit = snapshot(dec!(1070.00));
        let entry = HistoryVisit::from_bill(&visit, facts(dec!(1070.00), PaymentStatus::Pending));
        assert_eq!(entry.source, HistorySource::Bill);
        assert_eq!(entry.gst_percentage, dec!(7));
        assert_eq!(entry.specialist, "Ayesha");
        assert_eq!(entry.total_amount, dec!(1070.00));
        assert!(!entry.drifted);
    }

    #[test]
    fn test_drift_is_flagged() {
        let visit = snapshot(dec!(1000));
        let entry = HistoryVisit::from_bill(&visit, facts(dec!(1070.00), PaymentStatus::Pending));
        assert!(entry.drifted);
        assert_eq!(entry.final_amount, dec!(1070.00));

        let paid_later = HistoryVisit::from_bill(&snapshot(dec!(1070.00)), facts(dec!(1070.00), PaymentStatus::Paid));
        assert!(paid_later.drifted);
    }

    #[test]
    fn test_snapshot_fallback() {
        let visit = snapshot(dec!(250));
        let entry = HistoryVisit::from_snapshot(&visit);
        assert_eq!(entry.source, HistorySource::Snapshot);
        assert_eq!(entry.final_amount, dec!(250));
        assert_eq!(entry.gst_percentage, Decimal::ZERO);
        assert!(entry.payment_method.is_none());
    }
}
