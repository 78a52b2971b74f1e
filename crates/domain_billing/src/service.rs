//! Billing service
//!
//! Creating a bill is one primary write followed by best-effort bookkeeping:
//! the visit is appended to the client through the client ledger, which in
//! turn notifies admins and managers. None of that bookkeeping can fail the
//! bill; each step is reported as a side effect on the returned outcome.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use core_kernel::{BillId, BillNumber, ClientId, Outcome, Page, PageRequest, SideEffect, StaffId};
use domain_client::ClientLedger;

use crate::bill::{
    parse_status, Bill, BillDraft, ClientRef, CreateBillRequest, PaymentUpdate, PrintableBill,
    ServiceSelectionRequest,
};
use crate::calculator::BillAmounts;
use crate::error::BillingError;
use crate::gst::GstService;
use crate::ports::{BillPort, BillQuery};
use crate::stats::{BillingStats, BillingSummary};

/// Side effect recorded when the bill's visit is appended to the client
pub const RECORD_VISIT: &str = "record_visit";

/// A page of one client's bills with totals over all of them
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientBillingHistory {
    pub bills: Page<Bill>,
    pub summary: BillingSummary,
}

/// Filters for a bill search
#[derive(Debug, Clone, Default)]
pub struct BillSearch {
    pub query: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

pub struct BillingService {
    bills: Arc<dyn BillPort>,
    gst: Arc<GstService>,
    clients: Arc<ClientLedger>,
}

impl BillingService {
    pub fn new(bills: Arc<dyn BillPort>, gst: Arc<GstService>, clients: Arc<ClientLedger>) -> Self {
        Self { bills, gst, clients }
    }

    /// Creates a bill for an existing client, or for a client found or
    /// created by phone number
    pub async fn create_bill(
        &self,
        request: CreateBillRequest,
        created_by: Option<StaffId>,
    ) -> Result<Outcome<Bill>, BillingError> {
        let draft = request.validate()?;
        self.create(BillDraft { created_by, ..draft }).await
    }

    /// Creates a pending bill from a service selection, summing the subtotal
    pub async fn create_from_services(
        &self,
        request: ServiceSelectionRequest,
        created_by: Option<StaffId>,
    ) -> Result<Outcome<Bill>, BillingError> {
        let draft = request.validate(Utc::now().date_naive())?;
        self.create(BillDraft { created_by, ..draft }).await
    }

    async fn create(&self, draft: BillDraft) -> Result<Outcome<Bill>, BillingError> {
        let (client_id, client_phone) = match &draft.client {
            ClientRef::Id(id) => {
                let client = self.clients.get_client(*id).await?;
                (client.id, client.phone_number)
            }
            ClientRef::Phone(phone) => {
                let added = self.clients.add_client(&draft.client_name, phone).await?;
                let client = added.client();
                (client.id, client.phone_number.clone())
            }
        };
        let client_phone = draft.client_phone.clone().unwrap_or(client_phone);

        let rate = self.gst.effective_rate().await;
        let amounts = BillAmounts::from_subtotal(draft.subtotal, draft.discount, rate);
        let bill = self
            .bills
            .insert(Bill::new(draft, client_id, client_phone, amounts))
            .await?;
        info!(
            bill_number = %bill.bill_number,
            client_id = %client_id,
            final_amount = %bill.final_amount,
            gst_percentage = %bill.gst_percentage,
            "Bill created"
        );

        let mut outcome = Outcome::new(bill.clone());
        match self.clients.add_visit(client_id, bill.visit_input()).await {
            Ok(recorded) => {
                outcome.push(SideEffect::applied(RECORD_VISIT));
                outcome.absorb(recorded);
            }
            Err(e) => {
                warn!(
                    bill_number = %bill.bill_number,
                    client_id = %client_id,
                    error = %e,
                    "Failed to record visit for bill"
                );
                outcome.push(SideEffect::failed(RECORD_VISIT, e));
            }
        }
        Ok(outcome)
    }

    pub async fn get_bill(&self, id: BillId) -> Result<Bill, BillingError> {
        self.bills
            .get(id)
            .await?
            .ok_or_else(|| BillingError::not_found("Bill", id))
    }

    pub async fn get_bill_by_number(&self, number: &str) -> Result<Bill, BillingError> {
        let number: BillNumber = number.trim().parse()?;
        self.bills
            .get_by_number(&number)
            .await?
            .ok_or_else(|| BillingError::not_found("Bill", &number))
    }

    /// Changes payment status, method and notes
    pub async fn update_payment(&self, id: BillId, update: PaymentUpdate) -> Result<Bill, BillingError> {
        let change = update.validate()?;
        let mut bill = self.get_bill(id).await?;
        bill.apply_payment(change, Utc::now());
        let saved = self.bills.save(&bill).await?;
        info!(bill_number = %saved.bill_number, status = %saved.payment_status, "Bill payment updated");
        Ok(saved)
    }

    pub async fn cancel_bill(&self, id: BillId, reason: Option<&str>) -> Result<Bill, BillingError> {
        let mut bill = self.get_bill(id).await?;
        bill.cancel(reason, Utc::now());
        let saved = self.bills.save(&bill).await?;
        info!(bill_number = %saved.bill_number, "Bill cancelled");
        Ok(saved)
    }

    /// Bills whose client name or phone contains the query
    pub async fn search_bills(&self, search: BillSearch, page: PageRequest) -> Result<Page<Bill>, BillingError> {
        let text = search
            .query
            .map(|q| q.trim().to_string())
            .filter(|q| !q.is_empty())
            .ok_or_else(|| BillingError::validation("Search query is required"))?;
        let query = BillQuery::matching(text)
            .with_status(parse_status(search.status.as_deref())?)
            .created_between(search.date_from, search.date_to);
        Ok(self.bills.find(&query, page).await?)
    }

    pub async fn client_billing_history(
        &self,
        client_id: ClientId,
        status: Option<&str>,
        page: PageRequest,
    ) -> Result<ClientBillingHistory, BillingError> {
        let query = BillQuery::for_client(client_id).with_status(parse_status(status)?);
        let bills = self.bills.find(&query, page).await?;
        let summary = self.bills.summarize(&query).await?;
        Ok(ClientBillingHistory { bills, summary })
    }

    pub async fn printable_bill(&self, id: BillId) -> Result<PrintableBill, BillingError> {
        Ok(self.get_bill(id).await?.printable())
    }

    pub async fn stats(&self, now: DateTime<Utc>) -> Result<BillingStats, BillingError> {
        Ok(self.bills.stats(now).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gst::mock::MockGstConfigPort;
    use crate::gst::{Actor, GstUpdate};
    use crate::ports::mock::MockBillPort;
    use crate::ports::BillLedgerFacts;
    use core_kernel::{PaymentStatus, Percentage};
    use domain_client::{HistorySource, MockClientPort, NOTIFY_ADMINS};
    use domain_notification::{MockNotificationPort, MockRecipientDirectory, NotificationFanout, StaffRole};
    use rust_decimal_macros::dec;

    struct Harness {
        billing: BillingService,
        bills: Arc<MockBillPort>,
        clients: Arc<MockClientPort>,
        ledger: Arc<ClientLedger>,
        gst: Arc<GstService>,
        gst_store: Arc<MockGstConfigPort>,
        notifications: Arc<MockNotificationPort>,
        directory: Arc<MockRecipientDirectory>,
    }

    async fn harness() -> Harness {
        let bills = Arc::new(MockBillPort::new());
        let clients = Arc::new(MockClientPort::new());
        let notifications = Arc::new(MockNotificationPort::new());
        let directory = Arc::new(MockRecipientDirectory::new());
        let fanout = Arc::new(NotificationFanout::new(notifications.clone(), directory.clone()));
        let ledger = Arc::new(ClientLedger::new(
            clients.clone(),
            Arc::new(BillLedgerFacts::new(bills.clone())),
            fanout,
        ));
        let gst_store = Arc::new(MockGstConfigPort::new());
        let gst = Arc::new(GstService::new(gst_store.clone()));
        gst.get(&Actor::new(StaffId::new(), "Owner")).await.unwrap();

        Harness {
            billing: BillingService::new(bills.clone(), gst.clone(), ledger.clone()),
            bills,
            clients,
            ledger,
            gst,
            gst_store,
            notifications,
            directory,
        }
    }

    async fn client(h: &Harness, phone: &str) -> ClientId {
        h.ledger.add_client("Jane", phone).await.unwrap().client().id
    }

    fn request(client_id: ClientId, price: i64) -> CreateBillRequest {
        serde_json::from_value(serde_json::json!({
            "clientId": client_id,
            "clientName": "Jane",
            "services": [{"name": "Haircut", "price": price}],
            "subtotal": price,
            "paymentMethod": "cash"
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_bill_updates_client_aggregates() {
        let h = harness().await;
        h.directory.add_account(StaffRole::Admin).await;
        h.directory.add_account(StaffRole::Manager).await;
        let id = client(&h, "923001234567").await;

        let outcome = h.billing.create_bill(request(id, 1000), None).await.unwrap();
        let bill = &outcome.primary;

        assert!(bill.bill_number.as_str().starts_with("BILL"));
        assert_eq!(bill.gst_amount, dec!(70.00));
        assert_eq!(bill.final_amount, dec!(1070.00));
        assert_eq!(bill.total_amount, dec!(1000));
        assert_eq!(bill.client_phone, "923001234567");
        assert!(!outcome.has_failures());
        assert!(outcome.effect(RECORD_VISIT).is_some());
        assert!(outcome.effect(NOTIFY_ADMINS).is_some());

        let client = h.ledger.get_client(id).await.unwrap();
        assert_eq!(client.total_visits, 1);
        assert_eq!(client.total_spent, dec!(1070.00));
        assert_eq!(client.visits[0].bill_id, Some(bill.id));
        assert_eq!(h.notifications.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_visit_failure_does_not_fail_bill() {
        let h = harness().await;
        let id = client(&h, "5550001").await;
        h.clients.fail_visit_appends(true);

        let outcome = h.billing.create_bill(request(id, 500), None).await.unwrap();
        assert!(outcome.effect(RECORD_VISIT).unwrap().is_failed());
        assert_eq!(h.bills.len().await, 1);
        assert_eq!(h.ledger.get_client(id).await.unwrap().total_visits, 0);
    }

    #[tokio::test]
    async fn test_unknown_client_is_not_found() {
        let h = harness().await;
        let result = h.billing.create_bill(request(ClientId::new(), 500), None).await;
        assert!(matches!(result, Err(BillingError::NotFound(_))));
        assert_eq!(h.bills.len().await, 0);
    }

    #[tokio::test]
    async fn test_gst_snapshot_survives_rate_change() {
        let h = harness().await;
        let id = client(&h, "5550002").await;
        let first = h.billing.create_bill(request(id, 1000), None).await.unwrap().primary;

        let actor = Actor::new(StaffId::new(), "Owner");
        h.gst
            .update(&actor, GstUpdate { gst_percentage: Some(Percentage::new(dec!(16)).unwrap()), ..Default::default() })
            .await
            .unwrap();
        let second = h.billing.create_bill(request(id, 1000), None).await.unwrap().primary;

        assert_eq!(h.billing.get_bill(first.id).await.unwrap().gst_percentage, dec!(7));
        assert_eq!(second.gst_percentage, dec!(16));
        assert_eq!(second.final_amount, dec!(1160.00));
    }

    #[tokio::test]
    async fn test_gst_lookup_failure_bills_at_zero() {
        let h = harness().await;
        let id = client(&h, "5550003").await;
        h.gst_store.set_failing(true);
        let bill = h.billing.create_bill(request(id, 1000), None).await.unwrap().primary;
        assert_eq!(bill.gst_amount, dec!(0));
        assert_eq!(bill.final_amount, dec!(1000));
    }

    #[tokio::test]
    async fn test_create_from_services_creates_client_by_phone() {
        let h = harness().await;
        let request: ServiceSelectionRequest = serde_json::from_value(serde_json::json!({
            "clientName": "Walk In",
            "clientPhone": "+92 311 0000000",
            "selectedServices": [{"name": "Cut", "price": 500}, {"name": "Blow dry", "price": 300}],
            "discount": 100
        }))
        .unwrap();

        let bill = h.billing.create_from_services(request.clone(), None).await.unwrap().primary;
        assert_eq!(bill.subtotal, dec!(800));
        assert_eq!(bill.amount_before_gst, dec!(700));
        assert_eq!(bill.final_amount, dec!(749.00));
        assert_eq!(bill.payment_status, PaymentStatus::Pending);

        h.billing.create_from_services(request, None).await.unwrap();
        assert_eq!(h.clients.len().await, 1);
        assert_eq!(h.ledger.get_client(bill.client_id).await.unwrap().total_visits, 2);
    }

    #[tokio::test]
    async fn test_payment_update_and_cancel() {
        let h = harness().await;
        let id = client(&h, "5550004").await;
        let bill = h.billing.create_bill(request(id, 200), None).await.unwrap().primary;

        let paid = h
            .billing
            .update_payment(
                bill.id,
                PaymentUpdate { payment_status: Some("paid".to_string()), ..Default::default() },
            )
            .await
            .unwrap();
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert!(paid.paid_at.is_some());

        let invalid = h
            .billing
            .update_payment(
                bill.id,
                PaymentUpdate { payment_status: Some("refunded".to_string()), ..Default::default() },
            )
            .await;
        assert!(matches!(invalid, Err(BillingError::InvalidStatus(_))));

        let missing = h.billing.update_payment(BillId::new(), PaymentUpdate::default()).await;
        assert!(matches!(missing, Err(BillingError::NotFound(_))));

        let cancelled = h.billing.cancel_bill(bill.id, Some("duplicate")).await.unwrap();
        assert_eq!(cancelled.payment_status, PaymentStatus::Cancelled);
        let again = h.billing.cancel_bill(bill.id, None).await.unwrap();
        assert_eq!(again.payment_status, PaymentStatus::Cancelled);
        assert!(again.notes.ends_with("Bill cancelled"));
    }

    #[tokio::test]
    async fn test_lookup_by_number_and_printable() {
        let h = harness().await;
        let id = client(&h, "5550005").await;
        let bill = h.billing.create_bill(request(id, 100), None).await.unwrap().primary;

        let found = h.billing.get_bill_by_number(bill.bill_number.as_str()).await.unwrap();
        assert_eq!(found.id, bill.id);
        assert!(matches!(
            h.billing.get_bill_by_number("BILL1").await,
            Err(BillingError::NotFound(_))
        ));
        assert!(matches!(
            h.billing.get_bill_by_number("INV-1").await,
            Err(BillingError::Validation(_))
        ));

        let print = h.billing.printable_bill(bill.id).await.unwrap();
        assert_eq!(print.total, dec!(107.00));
        assert_eq!(print.bill_number, bill.bill_number);
    }

    #[tokio::test]
    async fn test_search_and_client_history() {
        let h = harness().await;
        let jane = client(&h, "5550006").await;
        let first = h.billing.create_bill(request(jane, 100), None).await.unwrap().primary;
        h.billing.create_bill(request(jane, 200), None).await.unwrap();
        h.billing
            .update_payment(first.id, PaymentUpdate { payment_status: Some("paid".to_string()), ..Default::default() })
            .await
            .unwrap();

        let found = h
            .billing
            .search_bills(BillSearch { query: Some("JANE".to_string()), ..Default::default() }, PageRequest::default())
            .await
            .unwrap();
        assert_eq!(found.total, 2);
        assert!(h
            .billing
            .search_bills(BillSearch::default(), PageRequest::default())
            .await
            .is_err());

        let history = h
            .billing
            .client_billing_history(jane, None, PageRequest::new(1, 1))
            .await
            .unwrap();
        assert_eq!(history.bills.items.len(), 1);
        assert_eq!(history.bills.total, 2);
        assert_eq!(history.summary.total_amount, dec!(321.00));
        assert_eq!(history.summary.paid_amount, dec!(107.00));

        let paid_only = h
            .billing
            .client_billing_history(jane, Some("paid"), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(paid_only.bills.total, 1);

        let again = h
            .billing
            .client_billing_history(jane, Some("paid"), PageRequest::default())
            .await
            .unwrap();
        assert_eq!(again, paid_only);
    }

    #[tokio::test]
    async fn test_history_reconciles_against_bills() {
        let h = harness().await;
        let id = client(&h, "5550007").await;
        let kept = h.billing.create_bill(request(id, 100), None).await.unwrap().primary;
        let removed = h.billing.create_bill(request(id, 300), None).await.unwrap().primary;

        h.billing
            .update_payment(kept.id, PaymentUpdate { payment_status: Some("paid".to_string()), ..Default::default() })
            .await
            .unwrap();
        h.bills.remove(removed.id).await;

        let history = h.ledger.client_history(id).await.unwrap();
        let kept_entry = history.visits.iter().find(|v| v.bill_id == Some(kept.id)).unwrap();
        assert_eq!(kept_entry.source, HistorySource::Bill);
        assert_eq!(kept_entry.payment_status, PaymentStatus::Paid);
        assert!(kept_entry.drifted);

        let removed_entry = history.visits.iter().find(|v| v.bill_id == Some(removed.id)).unwrap();
        assert_eq!(removed_entry.source, HistorySource::Snapshot);
        assert_eq!(removed_entry.final_amount, dec!(321.00));
    }

    #[tokio::test]
    async fn test_stats_revenue_counts_paid_only() {
        let h = harness().await;
        let id = client(&h, "5550008").await;
        let paid = h.billing.create_bill(request(id, 100), None).await.unwrap().primary;
        h.billing.create_bill(request(id, 200), None).await.unwrap();
        h.billing
            .update_payment(paid.id, PaymentUpdate { payment_status: Some("paid".to_string()), ..Default::default() })
            .await
            .unwrap();

        let stats = h.billing.stats(Utc::now()).await.unwrap();
        assert_eq!(stats.total_bills, 2);
        assert_eq!(stats.today_revenue, dec!(107.00));
        assert_eq!(stats.recent_bills.len(), 2);
    }
}
