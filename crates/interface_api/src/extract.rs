//! Request extractors that reject with the API error envelope
//!
//! `axum::Json` and `axum::extract::Query` answer a malformed request with a
//! plain-text body. These wrappers run the same extraction and convert the
//! rejection into `ApiError`.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::ApiError;

/// JSON request body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

/// Query string
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiError))]
pub struct ApiQuery<T>(pub T);
