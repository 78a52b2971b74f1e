//! Test Utilities Crate
//!
//! Shared test infrastructure for the salon billing workspace.
//!
//! # Modules
//!
//! - `fixtures`: fixed services, phones, instants and staff
//! - `builders`: builders for clients, bills, bill requests and notifications
//! - `database`: PostgreSQL testcontainer with migrations applied
//! - `assertions`: billing arithmetic, client aggregate and side-effect checks
//! - `generators`: proptest strategies for money, rates, services and phones

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;
