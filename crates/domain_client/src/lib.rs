//! Client Domain
//!
//! Client records with an embedded, append-only visit ledger.
//!
//! Each visit is a denormalised copy of one billing transaction. Appending a
//! visit updates the client's running aggregates (`total_visits`,
//! `total_spent`, `last_visit`) in the same store operation. When a visit
//! refers to a bill, the bill ledger is the source of truth: history reads
//! reconcile every such visit against its bill and flag snapshots that have
//! drifted.

pub mod client;
pub mod visit;
pub mod history;
pub mod error;
pub mod ports;
pub mod ledger;

pub use client::{normalize_phone, Client, ClientSummary, ClientUpdate};
pub use visit::{Visit, VisitInput};
pub use history::{BillFacts, ClientHistory, HistorySource, HistoryVisit};
pub use error::ClientError;
pub use ports::{BillFactsSource, ClientPort};
pub use ledger::{AddedClient, ClientLedger, ClientStats, MonthCount, VisitRecorded, NOTIFY_ADMINS, NOTIFY_MANAGERS};
#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockBillFacts, MockClientPort};
