//! Billing Domain
//!
//! GST configuration, bill amount calculation and the bill ledger.
//!
//! # Amounts
//!
//! ```text
//! subtotal          = sum of service prices (or caller supplied)
//! amount_before_gst = subtotal - discount
//! gst_amount        = round2(amount_before_gst * gst_percentage / 100)
//! final_amount      = round2(amount_before_gst + gst_amount)
//! total_amount      = subtotal
//! ```
//!
//! A bill copies the effective GST rate when it is created. Revising the
//! configuration never changes an existing bill.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain_billing::{BillingService, CreateBillRequest};
//!
//! let outcome = billing.create_bill(request, Some(staff_id)).await?;
//! if outcome.has_failures() {
//!     // the bill exists; visit or notification bookkeeping did not complete
//! }
//! ```

pub mod gst;
pub mod calculator;
pub mod bill;
pub mod stats;
pub mod ports;
pub mod service;
pub mod error;

pub use gst::{Actor, AppliedTo, GstConfig, GstConfigPort, GstForBilling, GstService, GstUpdate};
pub use calculator::{BillAmounts, GstCalculation};
pub use bill::{
    Bill, BillDraft, BillSummary, ClientRef, CreateBillRequest, PaymentChange, PaymentUpdate,
    PrintableBill, ServiceSelectionRequest,
};
pub use stats::{BillingStats, BillingSummary, MonthlyRevenue, ServiceUsage, StatsWindow, StatusBreakdown};
pub use ports::{BillLedgerFacts, BillPort, BillQuery};
pub use service::{BillSearch, BillingService, ClientBillingHistory, RECORD_VISIT};
pub use error::BillingError;
#[cfg(any(test, feature = "mock"))]
pub use gst::mock::MockGstConfigPort;
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::MockBillPort;
