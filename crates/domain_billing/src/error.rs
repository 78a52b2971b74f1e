//! Billing domain errors

use core_kernel::{CoreError, MoneyError, PortError};
use domain_client::ClientError;
use thiserror::Error;

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Required fields missing or malformed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A payment status outside the allowed set was supplied
    #[error("Invalid payment status: {0}")]
    InvalidStatus(String),

    /// Bill, client or configuration not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Duplicate bill number or configuration revision
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A store failed
    #[error(transparent)]
    Port(PortError),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        BillingError::NotFound(format!("{} {}", entity, id))
    }
}

impl From<PortError> for BillingError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { entity_type, id } => BillingError::not_found(&entity_type, id),
            PortError::Conflict { message } => BillingError::Conflict(message),
            PortError::Validation { message, .. } => BillingError::Validation(message),
            other => BillingError::Port(other),
        }
    }
}

impl From<CoreError> for BillingError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound(message) => BillingError::NotFound(message),
            CoreError::Validation(message) => BillingError::Validation(message),
            other => BillingError::Validation(other.to_string()),
        }
    }
}

impl From<MoneyError> for BillingError {
    fn from(error: MoneyError) -> Self {
        BillingError::Validation(error.to_string())
    }
}

impl From<ClientError> for BillingError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::Validation(message) => BillingError::Validation(message),
            ClientError::NotFound(id) => BillingError::NotFound(format!("Client {}", id)),
            ClientError::Conflict(message) => BillingError::Conflict(message),
            ClientError::Port(port) => BillingError::Port(port),
        }
    }
}
