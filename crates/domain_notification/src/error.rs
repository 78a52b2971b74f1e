//! Notification domain errors

use core_kernel::PortError;
use thiserror::Error;

/// Errors that can occur in the notification domain
#[derive(Debug, Error)]
pub enum NotificationError {
    /// Required fields missing or malformed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Notification absent or not addressed to the caller
    #[error("Notification not found: {0}")]
    NotFound(String),

    /// A broadcast reached nobody
    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    /// The notification store failed
    #[error(transparent)]
    Port(#[from] PortError),
}

impl NotificationError {
    pub fn validation(message: impl Into<String>) -> Self {
        NotificationError::Validation(message.into())
    }
}
