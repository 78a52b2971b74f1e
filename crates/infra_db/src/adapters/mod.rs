//! Domain Adapters
//!
//! PostgreSQL implementations of the domain ports. Each adapter wraps a
//! repository, converts its rows into domain values and reports failures as
//! `PortError`.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_billing::BillPort;
//! use infra_db::PostgresBillAdapter;
//!
//! let bills: Arc<dyn BillPort> = Arc::new(PostgresBillAdapter::new(pool));
//! ```

pub mod client;
pub mod bill;
pub mod gst;
pub mod notification;
pub mod staff;

pub use client::PostgresClientAdapter;
pub use bill::PostgresBillAdapter;
pub use gst::PostgresGstConfigAdapter;
pub use notification::PostgresNotificationAdapter;
pub use staff::PostgresStaffDirectory;

use std::fmt::Display;
use std::str::FromStr;
use std::time::Instant;

use sqlx::PgPool;

use core_kernel::{HealthCheckResult, PortError};

/// Parses a stored text column back into its domain vocabulary
pub(crate) fn parse_column<T>(value: &str, column: &str) -> Result<T, PortError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .parse()
        .map_err(|e| PortError::transformation(format!("column {}: {}", column, e)))
}

/// Converts a stored integer into an unsigned domain count
pub(crate) fn unsigned<T>(value: i64, column: &str) -> Result<T, PortError>
where
    T: TryFrom<i64>,
{
    T::try_from(value)
        .map_err(|_| PortError::transformation(format!("column {}: {} is out of range", column, value)))
}

/// Runs `SELECT 1` and times it
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::healthy(adapter_id, latency_ms),
        Err(e) => HealthCheckResult::unhealthy(adapter_id, latency_ms, format!("Database error: {}", e)),
    }
}
