//! Client repository
//!
//! Clients live in `clients`; their visits are rows of `client_visits`
//! ordered by insertion. The running aggregates on `clients` are only ever
//! changed together with a visit insert, inside one transaction.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::ServiceLine;

use crate::error::DatabaseError;
use super::contains_pattern;

const CLIENT_COLUMNS: &str = "id, client_code, name, phone_number, total_visits, total_spent, \
     last_visit, created_at, updated_at";

const VISIT_COLUMNS: &str = "client_id, visit_id, visit_date, services, bill_number, bill_id, \
     subtotal, discount, gst_amount, final_amount, total_amount, payment_status, notes, specialist";

/// A row of `clients`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClientRow {
    pub id: Uuid,
    pub client_code: String,
    pub name: String,
    pub phone_number: String,
    pub total_visits: i32,
    pub total_spent: Decimal,
    pub last_visit: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A row of `client_visits`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VisitRow {
    pub client_id: Uuid,
    pub visit_id: String,
    pub visit_date: DateTime<Utc>,
    pub services: Json<Vec<ServiceLine>>,
    pub bill_number: Option<String>,
    pub bill_id: Option<Uuid>,
    pub subtotal: Option<Decimal>,
    pub discount: Decimal,
    pub gst_amount: Option<Decimal>,
    pub final_amount: Decimal,
    pub total_amount: Decimal,
    pub payment_status: String,
    pub notes: String,
    pub specialist: String,
}

#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: PgPool,
}

impl ClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_phone(&self, phone_number: &str) -> Result<Option<ClientRow>, DatabaseError> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE lower(phone_number) = lower($1)");
        let row = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Draws the next value of `client_code_seq`
    pub async fn next_code_sequence(&self) -> Result<i64, DatabaseError> {
        let next = sqlx::query_scalar::<_, i64>("SELECT nextval('client_code_seq')")
            .fetch_one(&self.pool)
            .await?;
        Ok(next)
    }

    /// Inserts a client without visits
    pub async fn insert(&self, client: &ClientRow) -> Result<ClientRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO clients ({CLIENT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {CLIENT_COLUMNS}"
        );
        let row = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(client.id)
            .bind(&client.client_code)
            .bind(&client.name)
            .bind(&client.phone_number)
            .bind(client.total_visits)
            .bind(client.total_spent)
            .bind(client.last_visit)
            .bind(client.created_at)
            .bind(client.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateEntry(_) => {
                    DatabaseError::duplicate("Client", "phone number", &client.phone_number)
                }
                other => other,
            })?;
        Ok(row)
    }

    pub async fn get(&self, id: Uuid) -> Result<ClientRow, DatabaseError> {
        let sql = format!("SELECT {CLIENT_COLUMNS} FROM clients WHERE id = $1");
        sqlx::query_as::<_, ClientRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Client", id))
    }

    /// Visits of the given clients in insertion order
    pub async fn visits_for(&self, client_ids: &[Uuid]) -> Result<Vec<VisitRow>, DatabaseError> {
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {VISIT_COLUMNS} FROM client_visits WHERE client_id = ANY($1) ORDER BY seq"
        );
        let rows = sqlx::query_as::<_, VisitRow>(&sql)
            .bind(client_ids)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Clients newest first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<ClientRow>, DatabaseError> {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Sets whichever of name and phone number are given
    pub async fn update(
        &self,
        id: Uuid,
        name: Option<&str>,
        phone_number: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<ClientRow, DatabaseError> {
        let sql = format!(
            "UPDATE clients SET \
                 name = COALESCE($2, name), \
                 phone_number = COALESCE($3, phone_number), \
                 updated_at = $4 \
             WHERE id = $1 \
             RETURNING {CLIENT_COLUMNS}"
        );
        sqlx::query_as::<_, ClientRow>(&sql)
            .bind(id)
            .bind(name)
            .bind(phone_number)
            .bind(now)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateEntry(_) => DatabaseError::DuplicateEntry(
                    "Phone number already exists with another client".to_string(),
                ),
                other => other,
            })?
            .ok_or_else(|| DatabaseError::not_found("Client", id))
    }

    /// Deletes a client; its visits go with it
    pub async fn delete(&self, id: Uuid) -> Result<(), DatabaseError> {
        let result = sqlx::query("DELETE FROM clients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Client", id));
        }
        Ok(())
    }

    /// Case-insensitive substring search on name, phone and client code
    pub async fn search(&self, query: &str) -> Result<Vec<ClientRow>, DatabaseError> {
        let sql = format!(
            "SELECT {CLIENT_COLUMNS} FROM clients \
             WHERE name ILIKE $1 OR phone_number ILIKE $1 OR client_code ILIKE $1 \
             ORDER BY created_at DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(contains_pattern(query))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// Inserts a visit and bumps the client's aggregates in one transaction
    pub async fn append_visit(&self, visit: &VisitRow) -> Result<ClientRow, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "UPDATE clients SET \
                 total_visits = total_visits + 1, \
                 total_spent = total_spent + $2, \
                 last_visit = $3, \
                 updated_at = $3 \
             WHERE id = $1 \
             RETURNING {CLIENT_COLUMNS}"
        );
        let client = sqlx::query_as::<_, ClientRow>(&sql)
            .bind(visit.client_id)
            .bind(visit.final_amount)
            .bind(visit.visit_date)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Client", visit.client_id))?;

        let sql = format!(
            "INSERT INTO client_visits ({VISIT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        );
        sqlx::query(&sql)
            .bind(visit.client_id)
            .bind(&visit.visit_id)
            .bind(visit.visit_date)
            .bind(&visit.services)
            .bind(&visit.bill_number)
            .bind(visit.bill_id)
            .bind(visit.subtotal)
            .bind(visit.discount)
            .bind(visit.gst_amount)
            .bind(visit.final_amount)
            .bind(visit.total_amount)
            .bind(&visit.payment_status)
            .bind(&visit.notes)
            .bind(&visit.specialist)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(client)
    }

    /// Creation times of clients created at or after `since`
    pub async fn created_since(&self, since: DateTime<Utc>) -> Result<Vec<DateTime<Utc>>, DatabaseError> {
        let times = sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT created_at FROM clients WHERE created_at >= $1 ORDER BY created_at",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(times)
    }
}
