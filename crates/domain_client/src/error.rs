//! Client domain errors

use core_kernel::{CoreError, PortError};
use thiserror::Error;

/// Errors that can occur in the client domain
#[derive(Debug, Error)]
pub enum ClientError {
    /// Required fields missing or malformed
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Client with the given id was not found
    #[error("Client not found: {0}")]
    NotFound(String),

    /// Phone number already belongs to another client
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The client store failed
    #[error(transparent)]
    Port(PortError),
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }
}

impl From<PortError> for ClientError {
    fn from(error: PortError) -> Self {
        match error {
            PortError::NotFound { id, .. } => ClientError::NotFound(id),
            PortError::Conflict { message } => ClientError::Conflict(message),
            PortError::Validation { message, .. } => ClientError::Validation(message),
            other => ClientError::Port(other),
        }
    }
}

impl From<CoreError> for ClientError {
    fn from(error: CoreError) -> Self {
        match error {
            CoreError::NotFound(message) => ClientError::NotFound(message),
            CoreError::Validation(message) => ClientError::Validation(message),
            other => ClientError::Validation(other.to_string()),
        }
    }
}
