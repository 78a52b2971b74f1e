//! Response envelope shared by every endpoint

use axum::{http::StatusCode, Json};
use serde::Serialize;

use core_kernel::{Outcome, PageRequest, SideEffect};

use crate::error::ApiError;

/// `{success, message, data}`
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// A 201 response
pub type Created<T> = Result<(StatusCode, Json<ApiResponse<T>>), ApiError>;

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: Some(data),
        })
    }

    pub fn created(message: impl Into<String>, data: T) -> (StatusCode, Json<Self>) {
        (StatusCode::CREATED, Self::ok(message, data))
    }
}

impl ApiResponse<()> {
    /// A success carrying only a message
    pub fn message(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data: None,
        })
    }
}

/// A primary result with the side effects reported next to its fields
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WithSideEffects<T> {
    #[serde(flatten)]
    pub data: T,
    pub side_effects: Vec<SideEffect>,
}

impl<T> From<Outcome<T>> for WithSideEffects<T> {
    fn from(outcome: Outcome<T>) -> Self {
        Self {
            data: outcome.primary,
            side_effects: outcome.side_effects,
        }
    }
}

/// Builds a page request, falling back to `default_limit`
pub(crate) fn page_request(page: Option<u32>, limit: Option<u32>, default_limit: u32) -> PageRequest {
    PageRequest::from_query(page, Some(limit.unwrap_or(default_limit)))
}
