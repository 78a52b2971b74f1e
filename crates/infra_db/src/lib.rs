//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the salon billing system, using SQLx.
//!
//! # Architecture
//!
//! Repositories own the SQL and work in row types. Adapters implement the
//! domain ports on top of them, converting rows into domain values and
//! database errors into `PortError`.
//!
//! | Port | Adapter | Tables |
//! |------|---------|--------|
//! | `ClientPort` | [`PostgresClientAdapter`] | `clients`, `client_visits` |
//! | `BillPort` | [`PostgresBillAdapter`] | `bills` |
//! | `GstConfigPort` | [`PostgresGstConfigAdapter`] | `gst_config_revisions` |
//! | `NotificationPort` | [`PostgresNotificationAdapter`] | `notifications` |
//! | `RecipientDirectory` | [`PostgresStaffDirectory`] | `admins`, `managers`, `employees` |
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresBillAdapter};
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/salon")).await?;
//! run_migrations(&pool).await?;
//! let bills = PostgresBillAdapter::new(pool.clone());
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{create_pool, create_pool_from_url, run_migrations, DatabaseConfig, DatabasePool, MIGRATOR};
pub use error::DatabaseError;
pub use adapters::{
    PostgresBillAdapter, PostgresClientAdapter, PostgresGstConfigAdapter,
    PostgresNotificationAdapter, PostgresStaffDirectory,
};
