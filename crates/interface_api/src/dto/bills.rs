//! Bill DTOs
//!
//! Create and payment bodies deserialize straight into the billing domain's
//! request types; only query strings and the cancel body live here.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Deserialize;

use core_kernel::PageRequest;
use domain_billing::BillSearch;

use super::common::page_request;

/// Query of `GET /bills/search/client`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchBillsQuery {
    pub query: Option<String>,
    pub status: Option<String>,
    pub date_from: Option<NaiveDate>,
    /// Inclusive: the whole day is searched
    pub date_to: Option<NaiveDate>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl SearchBillsQuery {
    pub fn into_search(self) -> (BillSearch, PageRequest) {
        let page = page_request(self.page, self.limit, 10);
        let search = BillSearch {
            query: self.query,
            status: self.status,
            date_from: self.date_from.map(start_of_day),
            date_to: self.date_to.map(end_of_day),
        };
        (search, page)
    }
}

/// Query of `GET /bills/client/:clientId/history`
#[derive(Debug, Default, Deserialize)]
pub struct BillHistoryQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl BillHistoryQuery {
    pub fn page_request(&self) -> PageRequest {
        page_request(self.page, self.limit, 10)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct CancelBillRequest {
    pub reason: Option<String>,
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_time(NaiveTime::MIN).and_utc()
}

fn end_of_day(day: NaiveDate) -> DateTime<Utc> {
    let last = NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN);
    day.and_time(last).and_utc()
}
