//! Bill repository
//!
//! Bills are written once and afterwards only their payment fields, notes
//! and `updated_at` change. Statistics are aggregated in SQL.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::ServiceLine;

use crate::error::DatabaseError;

const BILL_COLUMNS: &str = "id, bill_number, client_id, client_name, client_phone, services, \
     appointment_date, start_time, specialist, total_duration, subtotal, discount, \
     amount_before_gst, gst_percentage, gst_amount, total_amount, final_amount, \
     payment_method, payment_status, paid_at, notes, created_by, created_at, updated_at";

/// Every filter is optional; `NULL` parameters match all rows
const FILTER_CLAUSE: &str = "($1::uuid IS NULL OR client_id = $1) \
     AND ($2::text IS NULL OR client_name ILIKE $2 OR client_phone ILIKE $2) \
     AND ($3::text IS NULL OR payment_status = $3) \
     AND ($4::timestamptz IS NULL OR created_at >= $4) \
     AND ($5::timestamptz IS NULL OR created_at <= $5)";

/// A row of `bills`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillRow {
    pub id: Uuid,
    pub bill_number: String,
    pub client_id: Uuid,
    pub client_name: String,
    pub client_phone: String,
    pub services: Json<Vec<ServiceLine>>,
    pub appointment_date: Option<NaiveDate>,
    pub start_time: Option<String>,
    pub specialist: String,
    pub total_duration: Option<i32>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub amount_before_gst: Decimal,
    pub gst_percentage: Decimal,
    pub gst_amount: Decimal,
    pub total_amount: Decimal,
    pub final_amount: Decimal,
    pub payment_method: String,
    pub payment_status: String,
    pub paid_at: Option<DateTime<Utc>>,
    pub notes: String,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Bill search parameters in storage form
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    pub client_id: Option<Uuid>,
    /// An `ILIKE` pattern
    pub text_pattern: Option<String>,
    pub status: Option<String>,
    pub created_from: Option<DateTime<Utc>>,
    pub created_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillTotalsRow {
    pub total_amount: Decimal,
    pub paid_amount: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatsCountsRow {
    pub total_bills: i64,
    pub today_bills: i64,
    pub monthly_bills: i64,
    pub today_revenue: Decimal,
    pub monthly_revenue: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct StatusCountRow {
    pub payment_status: String,
    pub count: i64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ServiceUsageRow {
    pub name: String,
    pub count: i64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MonthlyRevenueRow {
    pub year: i32,
    pub month: i32,
    pub revenue: Decimal,
    pub bill_count: i64,
}

#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: PgPool,
}

impl BillRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert(&self, bill: &BillRow) -> Result<BillRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO bills ({BILL_COLUMNS}) VALUES ( \
                 $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, \
                 $13, $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24) \
             RETURNING {BILL_COLUMNS}"
        );
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(bill.id)
            .bind(&bill.bill_number)
            .bind(bill.client_id)
            .bind(&bill.client_name)
            .bind(&bill.client_phone)
            .bind(&bill.services)
            .bind(bill.appointment_date)
            .bind(&bill.start_time)
            .bind(&bill.specialist)
            .bind(bill.total_duration)
            .bind(bill.subtotal)
            .bind(bill.discount)
            .bind(bill.amount_before_gst)
            .bind(bill.gst_percentage)
            .bind(bill.gst_amount)
            .bind(bill.total_amount)
            .bind(bill.final_amount)
            .bind(&bill.payment_method)
            .bind(&bill.payment_status)
            .bind(bill.paid_at)
            .bind(&bill.notes)
            .bind(bill.created_by)
            .bind(bill.created_at)
            .bind(bill.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateEntry(_) => {
                    DatabaseError::duplicate("Bill", "number", &bill.bill_number)
                }
                other => other,
            })?;
        Ok(row)
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<BillRow>, DatabaseError> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1");
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn get_by_number(&self, bill_number: &str) -> Result<Option<BillRow>, DatabaseError> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills WHERE bill_number = $1");
        let row = sqlx::query_as::<_, BillRow>(&sql)
            .bind(bill_number)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Writes back the payment fields and notes
    pub async fn save(&self, bill: &BillRow) -> Result<BillRow, DatabaseError> {
        let sql = format!(
            "UPDATE bills SET \
                 payment_status = $2, payment_method = $3, paid_at = $4, notes = $5, updated_at = $6 \
             WHERE id = $1 \
             RETURNING {BILL_COLUMNS}"
        );
        sqlx::query_as::<_, BillRow>(&sql)
            .bind(bill.id)
            .bind(&bill.payment_status)
            .bind(&bill.payment_method)
            .bind(bill.paid_at)
            .bind(&bill.notes)
            .bind(bill.updated_at)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Bill", bill.id))
    }

    /// Matching bills newest first, with the total match count
    pub async fn find(
        &self,
        filter: &BillFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<BillRow>, i64), DatabaseError> {
        let sql = format!(
            "SELECT {BILL_COLUMNS} FROM bills WHERE {FILTER_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query_as::<_, BillRow>(&sql)
            .bind(filter.client_id)
            .bind(&filter.text_pattern)
            .bind(&filter.status)
            .bind(filter.created_from)
            .bind(filter.created_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!("SELECT COUNT(*) FROM bills WHERE {FILTER_CLAUSE}");
        let total = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.client_id)
            .bind(&filter.text_pattern)
            .bind(&filter.status)
            .bind(filter.created_from)
            .bind(filter.created_to)
            .fetch_one(&self.pool)
            .await?;

        Ok((rows, total))
    }

    /// Final-amount totals over every matching bill
    pub async fn totals(&self, filter: &BillFilter) -> Result<BillTotalsRow, DatabaseError> {
        let sql = format!(
            "SELECT \
                 COALESCE(SUM(final_amount), 0) AS total_amount, \
                 COALESCE(SUM(final_amount) FILTER (WHERE payment_status = 'paid'), 0) AS paid_amount \
             FROM bills WHERE {FILTER_CLAUSE}"
        );
        let row = sqlx::query_as::<_, BillTotalsRow>(&sql)
            .bind(filter.client_id)
            .bind(&filter.text_pattern)
            .bind(&filter.status)
            .bind(filter.created_from)
            .bind(filter.created_to)
            .fetch_one(&self.pool)
            .await?;
        Ok(row)
    }

    /// Bill counts and paid revenue for today and the current month
    pub async fn stats_counts(
        &self,
        today_start: DateTime<Utc>,
        tomorrow_start: DateTime<Utc>,
        month_start: DateTime<Utc>,
    ) -> Result<StatsCountsRow, DatabaseError> {
        let row = sqlx::query_as::<_, StatsCountsRow>(
            r#"
            SELECT
                COUNT(*) AS total_bills,
                COUNT(*) FILTER (WHERE created_at >= $1 AND created_at < $2) AS today_bills,
                COUNT(*) FILTER (WHERE created_at >= $3) AS monthly_bills,
                COALESCE(SUM(final_amount) FILTER (
                    WHERE payment_status = 'paid' AND created_at >= $1 AND created_at < $2
                ), 0) AS today_revenue,
                COALESCE(SUM(final_amount) FILTER (
                    WHERE payment_status = 'paid' AND created_at >= $3
                ), 0) AS monthly_revenue
            FROM bills
            "#,
        )
        .bind(today_start)
        .bind(tomorrow_start)
        .bind(month_start)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn status_counts(&self) -> Result<Vec<StatusCountRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, StatusCountRow>(
            r#"
            SELECT payment_status, COUNT(*) AS count, COALESCE(SUM(final_amount), 0) AS total_amount
            FROM bills
            GROUP BY payment_status
            ORDER BY payment_status
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Most billed services by line count
    pub async fn top_services(&self, limit: i64) -> Result<Vec<ServiceUsageRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ServiceUsageRow>(
            r#"
            SELECT
                line->>'name' AS name,
                COUNT(*) AS count,
                COALESCE(SUM((line->>'price')::numeric), 0) AS total_revenue
            FROM bills, jsonb_array_elements(services) AS line
            GROUP BY line->>'name'
            ORDER BY count DESC, line->>'name' COLLATE "C" ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    /// Paid revenue per UTC calendar month since `since`, oldest first
    pub async fn monthly_revenue(&self, since: DateTime<Utc>) -> Result<Vec<MonthlyRevenueRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, MonthlyRevenueRow>(
            r#"
            SELECT
                EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::int AS year,
                EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::int AS month,
                SUM(final_amount) AS revenue,
                COUNT(*) AS bill_count
            FROM bills
            WHERE payment_status = 'paid' AND created_at >= $1
            GROUP BY 1, 2
            ORDER BY 1, 2
            "#,
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn recent(&self, limit: i64) -> Result<Vec<BillRow>, DatabaseError> {
        let sql = format!("SELECT {BILL_COLUMNS} FROM bills ORDER BY created_at DESC, id DESC LIMIT $1");
        let rows = sqlx::query_as::<_, BillRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
