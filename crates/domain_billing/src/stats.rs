//! Billing statistics for the manager dashboard
//!
//! Only `paid` bills count toward revenue. Bill counts include every status.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Duration, Months, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::PaymentStatus;

use crate::bill::{Bill, BillSummary};

pub const TOP_SERVICES: usize = 10;
pub const RECENT_BILLS: usize = 10;
pub const TREND_MONTHS: u32 = 6;

/// The period boundaries statistics are computed over, in UTC
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatsWindow {
    pub today_start: DateTime<Utc>,
    pub tomorrow_start: DateTime<Utc>,
    pub month_start: DateTime<Utc>,
    pub trend_start: DateTime<Utc>,
}

impl StatsWindow {
    pub fn at(now: DateTime<Utc>) -> Self {
        let today = now.date_naive();
        let today_start = today.and_time(NaiveTime::MIN).and_utc();
        let month_start = today.with_day(1).unwrap_or(today).and_time(NaiveTime::MIN).and_utc();
        let trend_start = today_start
            .checked_sub_months(Months::new(TREND_MONTHS))
            .unwrap_or(today_start);
        Self {
            today_start,
            tomorrow_start: today_start + Duration::days(1),
            month_start,
            trend_start,
        }
    }

    pub fn is_today(&self, at: DateTime<Utc>) -> bool {
        at >= self.today_start && at < self.tomorrow_start
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusBreakdown {
    pub status: PaymentStatus,
    pub count: u64,
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceUsage {
    pub name: String,
    pub count: u64,
    pub total_revenue: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: u32,
    pub revenue: Decimal,
    pub bill_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingStats {
    pub total_bills: u64,
    pub today_bills: u64,
    pub monthly_bills: u64,
    pub today_revenue: Decimal,
    pub monthly_revenue: Decimal,
    pub bills_by_status: Vec<StatusBreakdown>,
    /// Most frequently billed services, at most ten
    pub top_services: Vec<ServiceUsage>,
    /// Paid revenue per calendar month over the last six months, oldest first
    pub monthly_trend: Vec<MonthlyRevenue>,
    pub recent_bills: Vec<BillSummary>,
}

impl BillingStats {
    /// Computes the statistics over a full set of bills
    pub fn compute(bills: &[Bill], now: DateTime<Utc>) -> Self {
        let window = StatsWindow::at(now);
        let paid = |b: &&Bill| b.payment_status.counts_as_revenue();

        let mut by_status: BTreeMap<&'static str, StatusBreakdown> = BTreeMap::new();
        let mut services: HashMap<&str, ServiceUsage> = HashMap::new();
        let mut trend: BTreeMap<(i32, u32), MonthlyRevenue> = BTreeMap::new();

        for bill in bills {
            let bucket = by_status
                .entry(bill.payment_status.as_str())
                .or_insert_with(|| StatusBreakdown {
                    status: bill.payment_status,
                    count: 0,
                    total_amount: Decimal::ZERO,
                });
            bucket.count += 1;
            bucket.total_amount += bill.final_amount;

            for service in &bill.services {
                let usage = services.entry(service.name.as_str()).or_insert_with(|| ServiceUsage {
                    name: service.name.clone(),
                    count: 0,
                    total_revenue: Decimal::ZERO,
                });
                usage.count += 1;
                usage.total_revenue += service.price;
            }

            if bill.payment_status.counts_as_revenue() && bill.created_at >= window.trend_start {
                let key = (bill.created_at.year(), bill.created_at.month());
                let month = trend.entry(key).or_insert_with(|| MonthlyRevenue {
                    year: key.0,
                    month: key.1,
                    revenue: Decimal::ZERO,
                    bill_count: 0,
                });
                month.revenue += bill.final_amount;
                month.bill_count += 1;
            }
        }

        let mut top_services: Vec<ServiceUsage> = services.into_values().collect();
        top_services.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
        top_services.truncate(TOP_SERVICES);

        let mut recent: Vec<&Bill> = bills.iter().collect();
        recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Self {
            total_bills: bills.len() as u64,
            today_bills: bills.iter().filter(|b| window.is_today(b.created_at)).count() as u64,
            monthly_bills: bills.iter().filter(|b| b.created_at >= window.month_start).count() as u64,
            today_revenue: bills
                .iter()
                .filter(paid)
                .filter(|b| window.is_today(b.created_at))
                .map(|b| b.final_amount)
                .sum(),
            monthly_revenue: bills
                .iter()
                .filter(paid)
                .filter(|b| b.created_at >= window.month_start)
                .map(|b| b.final_amount)
                .sum(),
            bills_by_status: by_status.into_values().collect(),
            top_services,
            monthly_trend: trend.into_values().collect(),
            recent_bills: recent.into_iter().take(RECENT_BILLS).map(Bill::summary).collect(),
        }
    }
}

/// Totals shown alongside a client's billing history
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingSummary {
    /// Sum of final amounts of the matching bills
    pub total_amount: Decimal,
    /// Sum of final amounts of the matching bills that are paid
    pub paid_amount: Decimal,
}

impl BillingSummary {
    pub fn compute<'a>(bills: impl IntoIterator<Item = &'a Bill>) -> Self {
        bills.into_iter().fold(Self::default(), |mut acc, bill| {
            acc.total_amount += bill.final_amount;
            if bill.payment_status == PaymentStatus::Paid {
                acc.paid_amount += bill.final_amount;
            }
            acc
        })
    }
}
