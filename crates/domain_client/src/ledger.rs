//! Client visit ledger service

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use core_kernel::{ClientId, Outcome, Page, PageRequest, SideEffect};
use domain_notification::{NotificationFanout, NotificationPayload, NotificationType, RelatedEntityType};

use crate::client::{normalize_phone, Client, ClientSummary, ClientUpdate};
use crate::error::ClientError;
use crate::history::{ClientHistory, HistoryVisit};
use crate::ports::{BillFactsSource, ClientPort};
use crate::visit::{Visit, VisitInput};

/// Side effect recorded when admins are notified of a visit
pub const NOTIFY_ADMINS: &str = "notify_admins";
/// Side effect recorded when managers are notified of a visit
pub const NOTIFY_MANAGERS: &str = "notify_managers";

/// Result of `add_client`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "client", rename_all = "snake_case")]
pub enum AddedClient {
    Created(ClientSummary),
    /// A client with the same normalised phone number already existed; no
    /// record or visit was created
    Existing(ClientSummary),
}

impl AddedClient {
    pub fn client(&self) -> &ClientSummary {
        match self {
            AddedClient::Created(c) | AddedClient::Existing(c) => c,
        }
    }

    pub fn is_new(&self) -> bool {
        matches!(self, AddedClient::Created(_))
    }
}

/// A visit appended to a client and the client's new aggregates
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitRecorded {
    pub client_id: ClientId,
    pub visit: Visit,
    pub total_visits: u32,
    pub total_spent: Decimal,
    pub last_visit: Option<DateTime<Utc>>,
}

/// Client counts for the dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientStats {
    pub total_clients: u64,
    pub clients_this_month: u64,
    pub clients_this_week: u64,
    pub monthly_breakdown: Vec<MonthCount>,
    pub recent_clients: Vec<ClientSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthCount {
    pub month: &'static str,
    pub count: u64,
}

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Client records, their visit ledgers and history reconciliation
pub struct ClientLedger {
    clients: Arc<dyn ClientPort>,
    bills: Arc<dyn BillFactsSource>,
    notifications: Arc<NotificationFanout>,
}

impl ClientLedger {
    pub fn new(
        clients: Arc<dyn ClientPort>,
        bills: Arc<dyn BillFactsSource>,
        notifications: Arc<NotificationFanout>,
    ) -> Self {
        Self { clients, bills, notifications }
    }

    /// Adds a client, or returns the existing one holding the same
    /// normalised phone number
    pub async fn add_client(&self, name: &str, phone_number: &str) -> Result<AddedClient, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::validation("Name and phone number are required"));
        }
        let phone = normalize_phone(phone_number)?;

        if let Some(existing) = self.clients.find_by_phone(&phone).await? {
            debug!(client_id = %existing.client_id, "Client already exists for phone number");
            return Ok(AddedClient::Existing(existing.summary()));
        }

        let code = self.clients.next_client_code().await?;
        let created = self.clients.insert(Client::new(code, name, phone)).await?;
        info!(client_id = %created.client_id, "Client created");
        Ok(AddedClient::Created(created.summary()))
    }

    /// Appends a visit, then notifies admins and managers. Notification
    /// failures are recorded on the outcome and never fail the visit.
    pub async fn add_visit(&self, id: ClientId, input: VisitInput) -> Result<Outcome<VisitRecorded>, ClientError> {
        let visit = input.resolve()?;
        let client = self.clients.append_visit(id, visit.clone()).await?;
        info!(
            client_id = %client.client_id,
            visit_id = %visit.visit_id,
            final_amount = %visit.final_amount,
            "Visit recorded"
        );

        let payload = visit_notification(&client, &visit);
        let (admins, managers) = self.notifications.notify_admins_and_managers(&payload).await;

        let recorded = VisitRecorded {
            client_id: client.id,
            visit,
            total_visits: client.total_visits,
            total_spent: client.total_spent,
            last_visit: client.last_visit,
        };
        Ok(Outcome::new(recorded)
            .with_effect(notification_effect(NOTIFY_ADMINS, admins))
            .with_effect(notification_effect(NOTIFY_MANAGERS, managers)))
    }

    /// The client's visits, each reconciled against its bill when one
    /// exists, newest first
    pub async fn client_history(&self, id: ClientId) -> Result<ClientHistory, ClientError> {
        let client = self.clients.get(id).await?;
        let mut visits = Vec::with_capacity(client.visits.len());

        for visit in &client.visits {
            let entry = match visit.bill_id {
                Some(bill_id) => match self.bills.bill_facts(bill_id).await {
                    Ok(Some(facts)) => HistoryVisit::from_bill(visit, facts),
                    Ok(None) => {
                        debug!(visit_id = %visit.visit_id, bill_id = %bill_id, "Bill missing, using visit snapshot");
                        HistoryVisit::from_snapshot(visit)
                    }
                    Err(e) => {
                        warn!(visit_id = %visit.visit_id, bill_id = %bill_id, error = %e, "Bill lookup failed, using visit snapshot");
                        HistoryVisit::from_snapshot(visit)
                    }
                },
                None => HistoryVisit::from_snapshot(visit),
            };
            visits.push(entry);
        }

        let history = ClientHistory::new(&client, visits);
        if history.drift_count() > 0 {
            warn!(client_id = %client.client_id, drifted = history.drift_count(), "Visit snapshots differ from bills");
        }
        Ok(history)
    }

    pub async fn get_client(&self, id: ClientId) -> Result<Client, ClientError> {
        Ok(self.clients.get(id).await?)
    }

    pub async fn list_clients(&self, page: PageRequest) -> Result<Page<ClientSummary>, ClientError> {
        Ok(self.clients.list(page).await?.map(|c| c.summary()))
    }

    /// Updates name and/or phone number; a phone number held by another
    /// client is a conflict
    pub async fn update_client(&self, id: ClientId, update: ClientUpdate) -> Result<ClientSummary, ClientError> {
        let update = update.normalized()?;
        if update.is_empty() {
            return Ok(self.clients.get(id).await?.summary());
        }
        if let Some(ref phone) = update.phone_number {
            if let Some(holder) = self.clients.find_by_phone(phone).await? {
                if holder.id != id {
                    return Err(ClientError::Conflict(
                        "Phone number already exists with another client".to_string(),
                    ));
                }
            }
        }
        Ok(self.clients.update(id, update).await?.summary())
    }

    pub async fn delete_client(&self, id: ClientId) -> Result<ClientSummary, ClientError> {
        let removed = self.clients.delete(id).await?;
        info!(client_id = %removed.client_id, "Client deleted");
        Ok(removed.summary())
    }

    pub async fn search_clients(&self, query: &str) -> Result<Vec<ClientSummary>, ClientError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ClientError::validation("Search query is required"));
        }
        Ok(self.clients.search(query).await?.iter().map(Client::summary).collect())
    }

    /// The client holding a phone number, after normalisation
    pub async fn check_phone_number(&self, phone_number: &str) -> Result<Option<ClientSummary>, ClientError> {
        let phone = normalize_phone(phone_number)?;
        Ok(self.clients.find_by_phone(&phone).await?.map(|c| c.summary()))
    }

    /// Counts for the current month, week (starting Sunday) and year, plus
    /// the ten newest clients
    pub async fn client_stats(&self, now: DateTime<Utc>) -> Result<ClientStats, ClientError> {
        let today = now.date_naive();
        let month_start = today.with_day(1).unwrap_or(today);
        let week_start = today - Duration::days(i64::from(today.weekday().num_days_from_sunday()));
        let year_start = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
        let since = week_start.min(year_start);

        let total_clients = self.clients.count().await?;
        let created = self.clients.created_since(start_of(since)).await?;

        let on_or_after = |day: NaiveDate| created.iter().filter(|at| at.date_naive() >= day).count() as u64;
        let mut by_month = [0u64; 12];
        for at in created.iter().filter(|at| at.year() == today.year()) {
            by_month[at.month0() as usize] += 1;
        }

        let recent = self.clients.list(PageRequest::new(1, 10)).await?;
        Ok(ClientStats {
            total_clients,
            clients_this_month: on_or_after(month_start),
            clients_this_week: on_or_after(week_start),
            monthly_breakdown: MONTHS
                .iter()
                .zip(by_month)
                .map(|(month, count)| MonthCount { month: *month, count })
                .collect(),
            recent_clients: recent.items.iter().map(Client::summary).collect(),
        })
    }
}

fn start_of(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(chrono::NaiveTime::MIN).and_utc()
}

fn visit_notification(client: &Client, visit: &Visit) -> NotificationPayload {
    let message = match &visit.bill_number {
        Some(number) => format!(
            "Bill {} of {} generated for {} ({})",
            number, visit.final_amount, client.name, client.client_id
        ),
        None => format!(
            "Visit of {} recorded for {} ({})",
            visit.final_amount, client.name, client.client_id
        ),
    };
    let payload = NotificationPayload::new("Bill Generated", message, NotificationType::BillGenerated);
    match visit.bill_id {
        Some(bill_id) => payload.related_to(RelatedEntityType::Bill, bill_id.to_string()),
        None => payload.related_to(RelatedEntityType::Client, client.id.to_string()),
    }
}

fn notification_effect(name: &str, delivered: bool) -> SideEffect {
    if delivered {
        SideEffect::applied(name)
    } else {
        SideEffect::failed(name, "no notifications written")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::{BillFacts, HistorySource};
    use crate::ports::mock::{MockBillFacts, MockClientPort};
    use core_kernel::{BillId, BillNumber, PaymentMethod, PaymentStatus, ServiceLine};
    use domain_notification::{MockNotificationPort, MockRecipientDirectory, StaffRole};
    use rust_decimal_macros::dec;

    struct Harness {
        ledger: ClientLedger,
        clients: Arc<MockClientPort>,
        bills: Arc<MockBillFacts>,
        notifications: Arc<MockNotificationPort>,
        directory: Arc<MockRecipientDirectory>,
    }

    fn harness() -> Harness {
        let clients = Arc::new(MockClientPort::new());
        let bills = Arc::new(MockBillFacts::new());
        let notifications = Arc::new(MockNotificationPort::new());
        let directory = Arc::new(MockRecipientDirectory::new());
        let fanout = Arc::new(NotificationFanout::new(notifications.clone(), directory.clone()));
        let ledger = ClientLedger::new(clients.clone(), bills.clone(), fanout);
        Harness { ledger, clients, bills, notifications, directory }
    }

    fn bill_facts(bill_id: BillId, final_amount: Decimal) -> BillFacts {
        BillFacts {
            bill_id,
            bill_number: BillNumber::generate(),
            services: vec![ServiceLine::new("Haircut", dec!(1000)).unwrap()],
            subtotal: dec!(1000),
            discount: Decimal::ZERO,
            amount_before_gst: dec!(1000),
            gst_percentage: dec!(7),
            gst_amount: dec!(70.00),
            final_amount,
            notes: "Regular".to_string(),
            specialist: "Sara".to_string(),
            appointment_date: None,
            start_time: None,
            total_duration: Some(45),
            payment_method: PaymentMethod::Cash,
            payment_status: PaymentStatus::Pending,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_phone_returns_existing_client() {
        let h = harness();
        let first = h.ledger.add_client("Jane", "+92 300-1234567").await.unwrap();
        let second = h.ledger.add_client("Jane2", "923001234567").await.unwrap();

        assert!(first.is_new());
        assert!(!second.is_new());
        assert_eq!(second.client().id, first.client().id);
        assert_eq!(second.client().name, "Jane");
        assert_eq!(second.client().total_visits, 0);
        assert_eq!(h.clients.len().await, 1);
    }

    #[tokio::test]
    async fn test_client_codes_are_sequential() {
        let h = harness();
        let a = h.ledger.add_client("A", "1001").await.unwrap();
        let b = h.ledger.add_client("B", "1002").await.unwrap();
        assert_eq!(a.client().client_id.as_str(), "CLT001");
        assert_eq!(b.client().client_id.as_str(), "CLT002");
    }

    #[tokio::test]
    async fn test_add_client_requires_name_and_phone() {
        let h = harness();
        assert!(matches!(h.ledger.add_client(" ", "123").await, Err(ClientError::Validation(_))));
        assert!(matches!(h.ledger.add_client("Jane", "  ").await, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_add_visit_updates_totals_and_notifies() {
        let h = harness();
        h.directory.add_account(StaffRole::Admin).await;
        h.directory.add_employee(StaffRole::Manager, true).await;
        let client = h.ledger.add_client("Jane", "5550001").await.unwrap();

        let input: VisitInput = serde_json::from_value(serde_json::json!({
            "totalBill": 1000,
            "finalAmount": 1070,
            "gst": 70
        }))
        .unwrap();
        let outcome = h.ledger.add_visit(client.client().id, input).await.unwrap();

        assert_eq!(outcome.primary.total_visits, 1);
        assert_eq!(outcome.primary.total_spent, dec!(1070));
        assert_eq!(outcome.primary.visit.gst_amount, Some(dec!(70)));
        assert!(!outcome.has_failures());
        assert_eq!(h.notifications.all().await.len(), 2);
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_visit() {
        let h = harness();
        h.directory.add_account(StaffRole::Admin).await;
        h.notifications.set_failing(true);
        let client = h.ledger.add_client("Jane", "5550002").await.unwrap();

        let outcome = h
            .ledger
            .add_visit(client.client().id, VisitInput { total_amount: Some(dec!(50)), ..Default::default() })
            .await
            .unwrap();

        assert!(outcome.has_failures());
        assert!(outcome.effect(NOTIFY_ADMINS).unwrap().is_failed());
        let stored = h.ledger.get_client(client.client().id).await.unwrap();
        assert_eq!(stored.total_visits, 1);
        assert_eq!(stored.total_spent, dec!(50));
    }

    #[tokio::test]
    async fn test_add_visit_to_unknown_client() {
        let h = harness();
        let result = h.ledger.add_visit(ClientId::new(), VisitInput::default()).await;
        assert!(matches!(result, Err(ClientError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_history_prefers_bill_and_falls_back_to_snapshot() {
        let h = harness();
        let client = h.ledger.add_client("Jane", "5550003").await.unwrap();
        let id = client.client().id;

        let live_bill = BillId::new();
        let deleted_bill = BillId::new();
        h.bills.put(bill_facts(live_bill, dec!(1070.00))).await;

        for (bill_id, amount) in [(live_bill, dec!(1000)), (deleted_bill, dec!(500))] {
            let input = VisitInput {
                bill_id: Some(bill_id),
                total_amount: Some(amount),
                ..Default::default()
            };
            h.ledger.add_visit(id, input).await.unwrap();
        }
        h.ledger.add_visit(id, VisitInput { total_amount: Some(dec!(20)), ..Default::default() }).await.unwrap();

        let history = h.ledger.client_history(id).await.unwrap();
        assert_eq!(history.visits.len(), 3);
        assert!(history.visits.windows(2).all(|w| w[0].date >= w[1].date));

        let from_bill = history.visits.iter().find(|v| v.bill_id == Some(live_bill)).unwrap();
        assert_eq!(from_bill.source, HistorySource::Bill);
        assert_eq!(from_bill.final_amount, dec!(1070.00));
        assert_eq!(from_bill.specialist, "Sara");
        assert!(from_bill.drifted);

        let orphan = history.visits.iter().find(|v| v.bill_id == Some(deleted_bill)).unwrap();
        assert_eq!(orphan.source, HistorySource::Snapshot);
        assert_eq!(orphan.final_amount, dec!(500));
        assert_eq!(history.drift_count(), 1);
    }

    #[tokio::test]
    async fn test_history_survives_bill_store_failure() {
        let h = harness();
        let client = h.ledger.add_client("Jane", "5550004").await.unwrap();
        let id = client.client().id;
        let input = VisitInput { bill_id: Some(BillId::new()), total_amount: Some(dec!(10)), ..Default::default() };
        h.ledger.add_visit(id, input).await.unwrap();
        h.bills.set_failing(true);

        let history = h.ledger.client_history(id).await.unwrap();
        assert_eq!(history.visits[0].source, HistorySource::Snapshot);
    }

    #[tokio::test]
    async fn test_update_client_phone_conflict() {
        let h = harness();
        let jane = h.ledger.add_client("Jane", "1111").await.unwrap();
        h.ledger.add_client("John", "2222").await.unwrap();

        let result = h
            .ledger
            .update_client(
                jane.client().id,
                ClientUpdate { name: None, phone_number: Some("22-22".to_string()) },
            )
            .await;
        assert!(matches!(result, Err(ClientError::Conflict(_))));

        let renamed = h
            .ledger
            .update_client(
                jane.client().id,
                ClientUpdate { name: Some("Janet".to_string()), phone_number: Some("1111".to_string()) },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Janet");
    }

    #[tokio::test]
    async fn test_search_check_phone_and_delete() {
        let h = harness();
        let jane = h.ledger.add_client("Jane Doe", "923001234567").await.unwrap();
        h.ledger.add_client("John", "923009999999").await.unwrap();

        assert_eq!(h.ledger.search_clients("doe").await.unwrap().len(), 1);
        assert_eq!(h.ledger.search_clients("92300").await.unwrap().len(), 2);
        assert!(h.ledger.search_clients("  ").await.is_err());

        let found = h.ledger.check_phone_number("+92 300 1234567").await.unwrap();
        assert_eq!(found.map(|c| c.id), Some(jane.client().id));
        assert!(h.ledger.check_phone_number("000").await.unwrap().is_none());

        h.ledger.delete_client(jane.client().id).await.unwrap();
        assert!(matches!(
            h.ledger.delete_client(jane.client().id).await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_and_stats() {
        let h = harness();
        for i in 0..12 {
            h.ledger.add_client(&format!("Client {}", i), &format!("300{}", i)).await.unwrap();
        }

        let page = h.ledger.list_clients(PageRequest::new(2, 5)).await.unwrap();
        assert_eq!(page.items.len(), 5);
        assert_eq!(page.total, 12);

        let now = Utc::now();
        let stats = h.ledger.client_stats(now).await.unwrap();
        assert_eq!(stats.total_clients, 12);
        assert_eq!(stats.clients_this_month, 12);
        assert_eq!(stats.clients_this_week, 12);
        assert_eq!(stats.recent_clients.len(), 10);
        assert_eq!(stats.monthly_breakdown.len(), 12);
        assert_eq!(stats.monthly_breakdown[now.month0() as usize].count, 12);
    }
}
