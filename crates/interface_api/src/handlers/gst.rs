//! GST configuration handlers

use axum::{
    extract::State,
    Extension,
};

use domain_billing::{GstCalculation, GstConfig, GstForBilling};

use crate::auth::{roles, Claims};
use crate::extract::{ApiJson, ApiQuery};
use crate::dto::gst::{CalculateGstRequest, GstHistoryQuery, UpdateGstRequest};
use crate::dto::{ApiResponse, ApiResult};
use crate::AppState;

/// Current configuration, seeded on first read
///
/// GET /api/v1/gst/config
pub async fn get_config(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<GstConfig> {
    claims.require_any(&[roles::ADMIN])?;
    let config = state.gst.get(&claims.actor()?).await?;
    Ok(ApiResponse::ok("GST configuration retrieved", config))
}

/// PUT /api/v1/gst/config
pub async fn update_config(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<UpdateGstRequest>,
) -> ApiResult<GstConfig> {
    claims.require_any(&[roles::ADMIN])?;
    let update = request.into_update()?;
    let config = state.gst.update(&claims.actor()?, update).await?;
    Ok(ApiResponse::ok("GST configuration updated successfully", config))
}

/// GET /api/v1/gst/history
pub async fn config_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<GstHistoryQuery>,
) -> ApiResult<Vec<GstConfig>> {
    claims.require_any(&[roles::ADMIN])?;
    let history = state.gst.history(query.limit.unwrap_or(10)).await?;
    Ok(ApiResponse::ok("GST history retrieved", history))
}

/// GET /api/v1/gst/billing
pub async fn for_billing(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<GstForBilling> {
    claims.require_any(&[roles::MANAGER, roles::ADMIN])?;
    let gst = state.gst.for_billing().await?;
    Ok(ApiResponse::ok("GST settings retrieved", gst))
}

/// POST /api/v1/gst/calculate
pub async fn calculate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<CalculateGstRequest>,
) -> ApiResult<GstCalculation> {
    claims.require_any(&[roles::MANAGER, roles::ADMIN])?;
    let calculation = state.gst.calculate(request.amount).await?;
    Ok(ApiResponse::ok("GST calculated", calculation))
}
