//! Billing Domain Ports

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{BillId, BillNumber, ClientId, DomainPort, Page, PageRequest, PaymentStatus, PortError};
use domain_client::{BillFacts, BillFactsSource};

use crate::bill::Bill;
use crate::stats::{BillingStats, BillingSummary};

/// Filter over the bill ledger. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BillQuery {
    pub client_id: Option<ClientId>,
    /// Case-insensitive substring of the client name or phone
    pub text: Option<String>,
    pub status: Option<PaymentStatus>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

impl BillQuery {
    pub fn for_client(client_id: ClientId) -> Self {
        Self {
            client_id: Some(client_id),
            ..Default::default()
        }
    }

    pub fn matching(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: Option<PaymentStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn created_between(mut self, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn matches(&self, bill: &Bill) -> bool {
        if self.client_id.is_some_and(|id| id != bill.client_id) {
            return false;
        }
        if self.status.is_some_and(|s| s != bill.payment_status) {
            return false;
        }
        if self.created_from.is_some_and(|from| bill.created_at < from) {
            return false;
        }
        if self.created_to.is_some_and(|to| bill.created_at > to) {
            return false;
        }
        match &self.text {
            Some(text) => {
                let needle = text.to_lowercase();
                bill.client_name.to_lowercase().contains(&needle)
                    || bill.client_phone.to_lowercase().contains(&needle)
            }
            None => true,
        }
    }
}

/// Storage for bills
#[async_trait]
pub trait BillPort: DomainPort {
    /// Persists a new bill; `Conflict` when the bill number is taken
    async fn insert(&self, bill: Bill) -> Result<Bill, PortError>;

    async fn get(&self, id: BillId) -> Result<Option<Bill>, PortError>;

    async fn get_by_number(&self, number: &BillNumber) -> Result<Option<Bill>, PortError>;

    /// Writes back the mutable fields: payment status and method, paid
    /// time, notes and update time
    async fn save(&self, bill: &Bill) -> Result<Bill, PortError>;

    /// Matching bills newest first
    async fn find(&self, query: &BillQuery, page: PageRequest) -> Result<Page<Bill>, PortError>;

    /// Totals over every matching bill, not just one page
    async fn summarize(&self, query: &BillQuery) -> Result<BillingSummary, PortError>;

    async fn stats(&self, now: DateTime<Utc>) -> Result<BillingStats, PortError>;
}

/// Exposes the bill ledger to the client ledger's history reconciliation
pub struct BillLedgerFacts {
    bills: Arc<dyn BillPort>,
}

impl BillLedgerFacts {
    pub fn new(bills: Arc<dyn BillPort>) -> Self {
        Self { bills }
    }
}

#[async_trait]
impl BillFactsSource for BillLedgerFacts {
    async fn bill_facts(&self, bill_id: BillId) -> Result<Option<BillFacts>, PortError> {
        Ok(self.bills.get(bill_id).await?.map(|bill| bill.facts()))
    }
}

/// In-memory bill ledger
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tokio::sync::RwLock;

    #[derive(Debug, Default)]
    pub struct MockBillPort {
        bills: Arc<RwLock<HashMap<BillId, Bill>>>,
        failing: AtomicBool,
    }

    impl MockBillPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes every call fail with a connection error
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }

        /// Removes a bill outright, as a data fix outside the service would
        pub async fn remove(&self, id: BillId) -> Option<Bill> {
            self.bills.write().await.remove(&id)
        }

        pub async fn len(&self) -> usize {
            self.bills.read().await.len()
        }

        fn check(&self) -> Result<(), PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("bill store unavailable"));
            }
            Ok(())
        }

        async fn matching(&self, query: &BillQuery) -> Vec<Bill> {
            let mut bills: Vec<Bill> = self
                .bills
                .read()
                .await
                .values()
                .filter(|b| query.matches(b))
                .cloned()
                .collect();
            bills.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            bills
        }
    }

    impl DomainPort for MockBillPort {}

    #[async_trait]
    impl BillPort for MockBillPort {
        async fn insert(&self, bill: Bill) -> Result<Bill, PortError> {
            self.check()?;
            let mut bills = self.bills.write().await;
            if bills.values().any(|b| b.bill_number == bill.bill_number) {
                return Err(PortError::conflict(format!(
                    "Bill number {} already exists",
                    bill.bill_number
                )));
            }
            bills.insert(bill.id, bill.clone());
            Ok(bill)
        }

        async fn get(&self, id: BillId) -> Result<Option<Bill>, PortError> {
            self.check()?;
            Ok(self.bills.read().await.get(&id).cloned())
        }

        async fn get_by_number(&self, number: &BillNumber) -> Result<Option<Bill>, PortError> {
            self.check()?;
            Ok(self
                .bills
                .read()
                .await
                .values()
                .find(|b| &b.bill_number == number)
                .cloned())
        }

        async fn save(&self, bill: &Bill) -> Result<Bill, PortError> {
            self.check()?;
            let mut bills = self.bills.write().await;
            let stored = bills
                .get_mut(&bill.id)
                .ok_or_else(|| PortError::not_found("Bill", bill.id))?;
            stored.payment_status = bill.payment_status;
            stored.payment_method = bill.payment_method;
            stored.paid_at = bill.paid_at;
            stored.notes = bill.notes.clone();
            stored.updated_at = bill.updated_at;
            Ok(stored.clone())
        }

        async fn find(&self, query: &BillQuery, page: PageRequest) -> Result<Page<Bill>, PortError> {
            self.check()?;
            Ok(Page::from_vec(self.matching(query).await, page))
        }

        async fn summarize(&self, query: &BillQuery) -> Result<BillingSummary, PortError> {
            self.check()?;
            Ok(BillingSummary::compute(&self.matching(query).await))
        }

        async fn stats(&self, now: DateTime<Utc>) -> Result<BillingStats, PortError> {
            self.check()?;
            let all: Vec<Bill> = self.bills.read().await.values().cloned().collect();
            Ok(BillingStats::compute(&all, now))
        }
    }
}
