//! PostgreSQL adapter for `BillPort`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    BillId, BillNumber, ClientId, DomainPort, HealthCheckResult, HealthCheckable, Page,
    PageRequest, PortError, StaffId,
};
use domain_billing::stats::{RECENT_BILLS, TOP_SERVICES};
use domain_billing::{
    Bill, BillPort, BillQuery, BillingStats, BillingSummary, MonthlyRevenue, ServiceUsage,
    StatsWindow, StatusBreakdown,
};

use crate::repositories::bill::{BillFilter, BillRepository, BillRow};
use crate::repositories::contains_pattern;
use super::{parse_column, ping, unsigned};

/// The bill ledger in PostgreSQL
#[derive(Debug, Clone)]
pub struct PostgresBillAdapter {
    repository: BillRepository,
    pool: PgPool,
}

impl PostgresBillAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: BillRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresBillAdapter {}

#[async_trait]
impl HealthCheckable for PostgresBillAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-bill-adapter").await
    }
}

#[async_trait]
impl BillPort for PostgresBillAdapter {
    #[instrument(skip(self, bill), fields(bill_number = %bill.bill_number))]
    async fn insert(&self, bill: Bill) -> Result<Bill, PortError> {
        debug!("Inserting bill");
        let row = self.repository.insert(&bill_row(&bill)).await?;
        to_bill(row)
    }

    #[instrument(skip(self), fields(bill_id = %id))]
    async fn get(&self, id: BillId) -> Result<Option<Bill>, PortError> {
        self.repository.get(id.into()).await?.map(to_bill).transpose()
    }

    #[instrument(skip(self), fields(bill_number = %number))]
    async fn get_by_number(&self, number: &BillNumber) -> Result<Option<Bill>, PortError> {
        self.repository
            .get_by_number(number.as_str())
            .await?
            .map(to_bill)
            .transpose()
    }

    #[instrument(skip(self, bill), fields(bill_id = %bill.id, status = %bill.payment_status))]
    async fn save(&self, bill: &Bill) -> Result<Bill, PortError> {
        let row = self.repository.save(&bill_row(bill)).await?;
        to_bill(row)
    }

    #[instrument(skip(self))]
    async fn find(&self, query: &BillQuery, page: PageRequest) -> Result<Page<Bill>, PortError> {
        let (rows, total) = self
            .repository
            .find(&filter(query), i64::from(page.limit), page.offset() as i64)
            .await?;
        let bills = rows.into_iter().map(to_bill).collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(bills, unsigned(total, "count")?, page))
    }

    async fn summarize(&self, query: &BillQuery) -> Result<BillingSummary, PortError> {
        let totals = self.repository.totals(&filter(query)).await?;
        Ok(BillingSummary {
            total_amount: totals.total_amount,
            paid_amount: totals.paid_amount,
        })
    }

    #[instrument(skip(self))]
    async fn stats(&self, now: DateTime<Utc>) -> Result<BillingStats, PortError> {
        let window = StatsWindow::at(now);
        let counts = self
            .repository
            .stats_counts(window.today_start, window.tomorrow_start, window.month_start)
            .await?;

        let bills_by_status = self
            .repository
            .status_counts()
            .await?
            .into_iter()
            .map(|row| {
                Ok(StatusBreakdown {
                    status: parse_column(&row.payment_status, "payment_status")?,
                    count: unsigned(row.count, "count")?,
                    total_amount: row.total_amount,
                })
            })
            .collect::<Result<Vec<_>, PortError>>()?;

        let top_services = self
            .repository
            .top_services(TOP_SERVICES as i64)
            .await?
            .into_iter()
            .map(|row| {
                Ok(ServiceUsage {
                    name: row.name,
                    count: unsigned(row.count, "count")?,
                    total_revenue: row.total_revenue,
                })
            })
            .collect::<Result<Vec<_>, PortError>>()?;

        let monthly_trend = self
            .repository
            .monthly_revenue(window.trend_start)
            .await?
            .into_iter()
            .map(|row| {
                Ok(MonthlyRevenue {
                    year: row.year,
                    month: unsigned(i64::from(row.month), "month")?,
                    revenue: row.revenue,
                    bill_count: unsigned(row.bill_count, "bill_count")?,
                })
            })
            .collect::<Result<Vec<_>, PortError>>()?;

        let recent_bills = self
            .repository
            .recent(RECENT_BILLS as i64)
            .await?
            .into_iter()
            .map(|row| to_bill(row).map(|bill| bill.summary()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BillingStats {
            total_bills: unsigned(counts.total_bills, "total_bills")?,
            today_bills: unsigned(counts.today_bills, "today_bills")?,
            monthly_bills: unsigned(counts.monthly_bills, "monthly_bills")?,
            today_revenue: counts.today_revenue,
            monthly_revenue: counts.monthly_revenue,
            bills_by_status,
            top_services,
            monthly_trend,
            recent_bills,
        })
    }
}

fn filter(query: &BillQuery) -> BillFilter {
    BillFilter {
        client_id: query.client_id.map(Uuid::from),
        text_pattern: query.text.as_deref().map(contains_pattern),
        status: query.status.map(|s| s.as_str().to_string()),
        created_from: query.created_from,
        created_to: query.created_to,
    }
}

fn bill_row(bill: &Bill) -> BillRow {
    BillRow {
        id: bill.id.into(),
        bill_number: bill.bill_number.as_str().to_string(),
        client_id: bill.client_id.into(),
        client_name: bill.client_name.clone(),
        client_phone: bill.client_phone.clone(),
        services: Json(bill.services.clone()),
        appointment_date: bill.appointment_date,
        start_time: bill.start_time.clone(),
        specialist: bill.specialist.clone(),
        total_duration: bill.total_duration.map(|d| i32::try_from(d).unwrap_or(i32::MAX)),
        subtotal: bill.subtotal,
        discount: bill.discount,
        amount_before_gst: bill.amount_before_gst,
        gst_percentage: bill.gst_percentage,
        gst_amount: bill.gst_amount,
        total_amount: bill.total_amount,
        final_amount: bill.final_amount,
        payment_method: bill.payment_method.as_str().to_string(),
        payment_status: bill.payment_status.as_str().to_string(),
        paid_at: bill.paid_at,
        notes: bill.notes.clone(),
        created_by: bill.created_by.map(Uuid::from),
        created_at: bill.created_at,
        updated_at: bill.updated_at,
    }
}

fn to_bill(row: BillRow) -> Result<Bill, PortError> {
    Ok(Bill {
        id: BillId::from_uuid(row.id),
        bill_number: BillNumber::from_stored(row.bill_number),
        client_id: ClientId::from_uuid(row.client_id),
        client_name: row.client_name,
        client_phone: row.client_phone,
        services: row.services.0,
        appointment_date: row.appointment_date,
        start_time: row.start_time,
        specialist: row.specialist,
        total_duration: row
            .total_duration
            .map(|d| unsigned(i64::from(d), "total_duration"))
            .transpose()?,
        subtotal: row.subtotal,
        discount: row.discount,
        amount_before_gst: row.amount_before_gst,
        gst_percentage: row.gst_percentage,
        gst_amount: row.gst_amount,
        total_amount: row.total_amount,
        final_amount: row.final_amount,
        payment_method: parse_column(&row.payment_method, "payment_method")?,
        payment_status: parse_column(&row.payment_status, "payment_status")?,
        paid_at: row.paid_at,
        notes: row.notes,
        created_by: row.created_by.map(StaffId::from_uuid),
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::{PaymentStatus, Percentage};
    use domain_billing::{BillAmounts, CreateBillRequest};
    use rust_decimal_macros::dec;

    fn sample_bill() -> Bill {
        let request: CreateBillRequest = serde_json::from_value(serde_json::json!({
            "clientId": ClientId::new(),
            "clientName": "Jane",
            "services": [{"name": "Haircut", "price": 1000, "duration": 30}],
            "subtotal": 1000,
            "paymentMethod": "card",
            "totalDuration": 30
        }))
        .unwrap();
        let draft = request.validate().unwrap();
        let amounts = BillAmounts::from_subtotal(dec!(1000), dec!(0), Percentage::new(dec!(7)).unwrap());
        let client_id = match draft.client {
            domain_billing::ClientRef::Id(id) => id,
            domain_billing::ClientRef::Phone(_) => ClientId::new(),
        };
        Bill::new(draft, client_id, "923001234567".to_string(), amounts)
    }

    #[test]
    fn test_bill_row_round_trip() {
        let bill = sample_bill();
        let row = bill_row(&bill);
        assert_eq!(row.payment_method, "card");
        assert_eq!(row.payment_status, "pending");
        assert_eq!(row.total_duration, Some(30));
        assert_eq!(to_bill(row).unwrap(), bill);
    }

    #[test]
    fn test_filter_translation() {
        let query = BillQuery::matching("50%").with_status(Some(PaymentStatus::Paid));
        let filter = filter(&query);
        assert_eq!(filter.text_pattern.as_deref(), Some("%50\\%%"));
        assert_eq!(filter.status.as_deref(), Some("paid"));
        assert!(filter.client_id.is_none());
    }
}
