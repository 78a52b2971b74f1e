//! Request handlers

pub mod bills;
pub mod clients;
pub mod gst;
pub mod health;
pub mod notifications;

use std::str::FromStr;

use crate::error::ApiError;

/// Parses a path segment, answering 400 when it is malformed
pub(crate) fn parse_path<T: FromStr>(raw: &str, what: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid {}: {}", what, raw)))
}
