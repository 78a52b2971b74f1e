//! Client Domain Ports
//!
//! [`ClientPort`] stores clients with their embedded visits.
//! [`BillFactsSource`] is the read-only view of the bill ledger used to
//! reconcile client history; the billing domain provides it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use core_kernel::{BillId, ClientCode, ClientId, DomainPort, Page, PageRequest, PortError};

use crate::client::{Client, ClientUpdate};
use crate::history::BillFacts;
use crate::visit::Visit;

/// Storage for clients and their visit ledgers
#[async_trait]
pub trait ClientPort: DomainPort {
    /// Finds a client by normalised phone number
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Client>, PortError>;

    /// Draws the next client code from an atomic sequence
    async fn next_client_code(&self) -> Result<ClientCode, PortError>;

    /// Inserts a new client; `Conflict` when the phone number is taken
    async fn insert(&self, client: Client) -> Result<Client, PortError>;

    /// Retrieves a client with its visits
    async fn get(&self, id: ClientId) -> Result<Client, PortError>;

    /// Clients newest first
    async fn list(&self, page: PageRequest) -> Result<Page<Client>, PortError>;

    /// Applies an already normalised update; `Conflict` when the new phone
    /// number belongs to another client
    async fn update(&self, id: ClientId, update: ClientUpdate) -> Result<Client, PortError>;

    /// Deletes a client, returning the removed record
    async fn delete(&self, id: ClientId) -> Result<Client, PortError>;

    /// Case-insensitive substring search on name, phone and client code,
    /// newest first
    async fn search(&self, query: &str) -> Result<Vec<Client>, PortError>;

    /// Appends a visit and updates `total_visits`, `total_spent` and
    /// `last_visit` in one step
    async fn append_visit(&self, id: ClientId, visit: Visit) -> Result<Client, PortError>;

    /// Total number of clients
    async fn count(&self) -> Result<u64, PortError>;

    /// Creation times of clients created at or after `since`
    async fn created_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, PortError>;
}

/// Read access to authoritative bill figures
#[async_trait]
pub trait BillFactsSource: Send + Sync {
    /// The bill's figures, or `None` when no bill has that id
    async fn bill_facts(&self, bill_id: BillId) -> Result<Option<BillFacts>, PortError>;
}

/// In-memory mocks of the client ports
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    /// In-memory client store
    #[derive(Debug, Default)]
    pub struct MockClientPort {
        clients: Arc<RwLock<HashMap<ClientId, Client>>>,
        sequence: AtomicU64,
        fail_visit_appends: AtomicBool,
    }

    impl MockClientPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Makes `append_visit` fail with a connection error
        pub fn fail_visit_appends(&self, failing: bool) {
            self.fail_visit_appends.store(failing, Ordering::SeqCst);
        }

        pub async fn len(&self) -> usize {
            self.clients.read().await.len()
        }

        fn newest_first(mut clients: Vec<Client>) -> Vec<Client> {
            clients.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
            clients
        }
    }

    impl DomainPort for MockClientPort {}

    #[async_trait]
    impl ClientPort for MockClientPort {
        async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Client>, PortError> {
            Ok(self
                .clients
                .read()
                .await
                .values()
                .find(|c| c.phone_number.eq_ignore_ascii_case(phone_number))
                .cloned())
        }

        async fn next_client_code(&self) -> Result<ClientCode, PortError> {
            let next = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(ClientCode::from_sequence(next))
        }

        async fn insert(&self, client: Client) -> Result<Client, PortError> {
            let mut clients = self.clients.write().await;
            if clients.values().any(|c| c.phone_number == client.phone_number) {
                return Err(PortError::conflict(format!(
                    "Phone number {} already exists",
                    client.phone_number
                )));
            }
            clients.insert(client.id, client.clone());
            Ok(client)
        }

        async fn get(&self, id: ClientId) -> Result<Client, PortError> {
            self.clients
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Client", id))
        }

        async fn list(&self, page: PageRequest) -> Result<Page<Client>, PortError> {
            let all = self.clients.read().await.values().cloned().collect();
            Ok(Page::from_vec(Self::newest_first(all), page))
        }

        async fn update(&self, id: ClientId, update: ClientUpdate) -> Result<Client, PortError> {
            let mut clients = self.clients.write().await;
            if let Some(ref phone) = update.phone_number {
                if clients.values().any(|c| c.id != id && &c.phone_number == phone) {
                    return Err(PortError::conflict("Phone number already exists with another client"));
                }
            }
            let client = clients
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Client", id))?;
            if let Some(name) = update.name {
                client.name = name;
            }
            if let Some(phone) = update.phone_number {
                client.phone_number = phone;
            }
            client.updated_at = Utc::now();
            Ok(client.clone())
        }

        async fn delete(&self, id: ClientId) -> Result<Client, PortError> {
            self.clients
                .write()
                .await
                .remove(&id)
                .ok_or_else(|| PortError::not_found("Client", id))
        }

        async fn search(&self, query: &str) -> Result<Vec<Client>, PortError> {
            let matching = self
                .clients
                .read()
                .await
                .values()
                .filter(|c| c.matches(query))
                .cloned()
                .collect();
            Ok(Self::newest_first(matching))
        }

        async fn append_visit(&self, id: ClientId, visit: Visit) -> Result<Client, PortError> {
            if self.fail_visit_appends.load(Ordering::SeqCst) {
                return Err(PortError::connection("client store unavailable"));
            }
            let mut clients = self.clients.write().await;
            let client = clients
                .get_mut(&id)
                .ok_or_else(|| PortError::not_found("Client", id))?;
            client.record_visit(visit);
            Ok(client.clone())
        }

        async fn count(&self) -> Result<u64, PortError> {
            Ok(self.clients.read().await.len() as u64)
        }

        async fn created_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, PortError> {
            Ok(self
                .clients
                .read()
                .await
                .values()
                .map(|c| c.created_at)
                .filter(|at| *at >= since)
                .collect())
        }
    }

    /// Bill facts held in memory
    #[derive(Debug, Default)]
    pub struct MockBillFacts {
        bills: Arc<RwLock<HashMap<BillId, BillFacts>>>,
        failing: AtomicBool,
    }

    impl MockBillFacts {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn put(&self, facts: BillFacts) {
            self.bills.write().await.insert(facts.bill_id, facts);
        }

        pub async fn remove(&self, bill_id: BillId) {
            self.bills.write().await.remove(&bill_id);
        }

        /// Makes every lookup fail with a connection error
        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl BillFactsSource for MockBillFacts {
        async fn bill_facts(&self, bill_id: BillId) -> Result<Option<BillFacts>, PortError> {
            if self.failing.load(Ordering::SeqCst) {
                return Err(PortError::connection("bill store unavailable"));
            }
            Ok(self.bills.read().await.get(&bill_id).cloned())
        }
    }
}
