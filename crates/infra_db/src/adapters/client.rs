//! PostgreSQL adapter for `ClientPort`

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BillId, BillNumber, ClientCode, ClientId, DomainPort, HealthCheckResult, HealthCheckable,
    Page, PageRequest, PortError, VisitId,
};
use domain_client::{Client, ClientPort, ClientUpdate, Visit};

use crate::repositories::client::{ClientRepository, ClientRow, VisitRow};
use super::{parse_column, ping, unsigned};

/// Clients and their visit rows in PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresClientAdapter {
    repository: ClientRepository,
    pool: PgPool,
}

impl PostgresClientAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: ClientRepository::new(pool.clone()),
            pool,
        }
    }

    /// Loads visits for a batch of client rows and assembles the clients
    async fn assemble(&self, rows: Vec<ClientRow>) -> Result<Vec<Client>, PortError> {
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut visits: HashMap<Uuid, Vec<Visit>> = HashMap::new();
        for row in self.repository.visits_for(&ids).await? {
            let owner = row.client_id;
            visits.entry(owner).or_default().push(to_visit(row)?);
        }
        rows.into_iter()
            .map(|row| {
                let own = visits.remove(&row.id).unwrap_or_default();
                to_client(row, own)
            })
            .collect()
    }

    async fn assemble_one(&self, row: ClientRow) -> Result<Client, PortError> {
        self.assemble(vec![row])
            .await?
            .pop()
            .ok_or_else(|| PortError::internal("client row vanished during assembly"))
    }
}

impl DomainPort for PostgresClientAdapter {}

#[async_trait]
impl HealthCheckable for PostgresClientAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-client-adapter").await
    }
}

#[async_trait]
impl ClientPort for PostgresClientAdapter {
    #[instrument(skip(self))]
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Client>, PortError> {
        match self.repository.find_by_phone(phone_number).await? {
            Some(row) => Ok(Some(self.assemble_one(row).await?)),
            None => Ok(None),
        }
    }

    async fn next_client_code(&self) -> Result<ClientCode, PortError> {
        let next = self.repository.next_code_sequence().await?;
        Ok(ClientCode::from_sequence(unsigned(next, "client_code_seq")?))
    }

    #[instrument(skip(self, client), fields(client_code = %client.client_id))]
    async fn insert(&self, client: Client) -> Result<Client, PortError> {
        debug!("Inserting client");
        let row = self.repository.insert(&client_row(&client)).await?;
        to_client(row, Vec::new())
    }

    #[instrument(skip(self), fields(client_id = %id))]
    async fn get(&self, id: ClientId) -> Result<Client, PortError> {
        let row = self.repository.get(id.into()).await?;
        self.assemble_one(row).await
    }

    async fn list(&self, page: PageRequest) -> Result<Page<Client>, PortError> {
        let rows = self
            .repository
            .list(i64::from(page.limit), page.offset() as i64)
            .await?;
        let total = unsigned(self.repository.count().await?, "count")?;
        Ok(Page::new(self.assemble(rows).await?, total, page))
    }

    #[instrument(skip(self, update), fields(client_id = %id))]
    async fn update(&self, id: ClientId, update: ClientUpdate) -> Result<Client, PortError> {
        let row = self
            .repository
            .update(id.into(), update.name.as_deref(), update.phone_number.as_deref(), Utc::now())
            .await?;
        self.assemble_one(row).await
    }

    #[instrument(skip(self), fields(client_id = %id))]
    async fn delete(&self, id: ClientId) -> Result<Client, PortError> {
        let client = self.get(id).await?;
        self.repository.delete(id.into()).await?;
        Ok(client)
    }

    async fn search(&self, query: &str) -> Result<Vec<Client>, PortError> {
        let rows = self.repository.search(query).await?;
        self.assemble(rows).await
    }

    #[instrument(skip(self, visit), fields(client_id = %id, visit_id = %visit.visit_id))]
    async fn append_visit(&self, id: ClientId, visit: Visit) -> Result<Client, PortError> {
        self.repository.append_visit(&visit_row(id, &visit)).await?;
        self.get(id).await
    }

    async fn count(&self) -> Result<u64, PortError> {
        unsigned(self.repository.count().await?, "count")
    }

    async fn created_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, PortError> {
        Ok(self.repository.created_since(since).await?)
    }
}

fn client_row(client: &Client) -> ClientRow {
    ClientRow {
        id: client.id.into(),
        client_code: client.client_id.as_str().to_string(),
        name: client.name.clone(),
        phone_number: client.phone_number.clone(),
        total_visits: i32::try_from(client.total_visits).unwrap_or(i32::MAX),
        total_spent: client.total_spent,
        last_visit: client.last_visit,
        created_at: client.created_at,
        updated_at: client.updated_at,
    }
}

fn visit_row(client_id: ClientId, visit: &Visit) -> VisitRow {
    VisitRow {
        client_id: client_id.into(),
        visit_id: visit.visit_id.as_str().to_string(),
        visit_date: visit.date,
        services: Json(visit.services.clone()),
        bill_number: visit.bill_number.as_ref().map(|n| n.as_str().to_string()),
        bill_id: visit.bill_id.map(Uuid::from),
        subtotal: visit.subtotal,
        discount: visit.discount,
        gst_amount: visit.gst_amount,
        final_amount: visit.final_amount,
        total_amount: visit.total_amount,
        payment_status: visit.payment_status.as_str().to_string(),
        notes: visit.notes.clone(),
        specialist: visit.specialist.clone(),
    }
}

fn to_client(row: ClientRow, visits: Vec<Visit>) -> Result<Client, PortError> {
    Ok(Client {
        id: ClientId::from_uuid(row.id),
        client_id: parse_column(&row.client_code, "client_code")?,
        name: row.name,
        phone_number: row.phone_number,
        total_visits: unsigned(i64::from(row.total_visits), "total_visits")?,
        total_spent: row.total_spent,
        last_visit: row.last_visit,
        visits,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn to_visit(row: VisitRow) -> Result<Visit, PortError> {
    Ok(Visit {
        visit_id: VisitId::from_stored(row.visit_id),
        date: row.visit_date,
        services: row.services.0,
        bill_number: row.bill_number.map(BillNumber::from_stored),
        bill_id: row.bill_id.map(BillId::from_uuid),
        subtotal: row.subtotal,
        discount: row.discount,
        gst_amount: row.gst_amount,
        final_amount: row.final_amount,
        total_amount: row.total_amount,
        payment_status: parse_column(&row.payment_status, "payment_status")?,
        notes: row.notes,
        specialist: row.specialist,
    })
}
