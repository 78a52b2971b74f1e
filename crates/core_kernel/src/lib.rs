//! Core Kernel - shared vocabulary for the salon billing system
//!
//! This crate provides the building blocks used across all domain modules:
//! - Decimal money rounding and percentage rates
//! - Identifiers and the human-facing bill, visit and client codes
//! - Payment vocabularies, service line items and pagination
//! - The primary/side-effect outcome type and the port error infrastructure

pub mod money;
pub mod identifiers;
pub mod error;
pub mod pagination;
pub mod outcome;
pub mod payment;
pub mod ports;
pub mod service_line;

pub use money::{round2, Percentage, MoneyError};
pub use identifiers::{
    BillId, ClientId, NotificationId, RecipientId, StaffId,
    BillNumber, VisitId, ClientCode,
};
pub use error::CoreError;
pub use pagination::{Page, PageRequest};
pub use outcome::{EffectStatus, Outcome, SideEffect};
pub use payment::{PaymentMethod, PaymentStatus};
pub use ports::{DomainPort, PortError, HealthCheckable, HealthCheckResult, AdapterHealth};
pub use service_line::{ServiceLine, ServiceLineInput};
