//! Data Transfer Objects
//!
//! Request bodies, query strings and the response envelope.

pub mod common;
pub mod bills;
pub mod clients;
pub mod gst;
pub mod notifications;

pub use common::{ApiResponse, ApiResult, Created, WithSideEffects};
