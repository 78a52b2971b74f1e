//! Client handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension,
};
use chrono::Utc;
use validator::Validate;

use core_kernel::{ClientId, Page};
use domain_client::{AddedClient, Client, ClientHistory, ClientStats, ClientSummary, ClientUpdate, VisitRecorded};

use super::parse_path;
use crate::auth::{roles, Claims};
use crate::extract::{ApiJson, ApiQuery};
use crate::dto::clients::{
    AddClientRequest, AddVisitRequest, CheckPhoneQuery, ListClientsQuery, PhoneCheck,
    SearchClientsQuery,
};
use crate::dto::{ApiResponse, ApiResult, Created, WithSideEffects};
use crate::AppState;

const STAFF: &[&str] = &[roles::MANAGER, roles::ADMIN];

fn client_id(raw: &str) -> Result<ClientId, crate::error::ApiError> {
    parse_path(raw, "client id")
}

/// Register a client, or return the one already holding the phone number
///
/// POST /api/v1/clients/add
pub async fn add_client(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<AddClientRequest>,
) -> Created<ClientSummary> {
    claims.require_any(STAFF)?;
    request.validate()?;

    let added = state.clients.add_client(&request.name, &request.phone_number).await?;
    Ok(match added {
        AddedClient::Created(client) => ApiResponse::created("Client added successfully", client),
        AddedClient::Existing(client) => (
            StatusCode::OK,
            ApiResponse::ok("Client with this phone number already exists", client),
        ),
    })
}

/// GET /api/v1/clients
pub async fn list_clients(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<ListClientsQuery>,
) -> ApiResult<Page<ClientSummary>> {
    claims.require_any(STAFF)?;
    let clients = state.clients.list_clients(query.page_request()).await?;
    Ok(ApiResponse::ok("Clients retrieved", clients))
}

/// GET /api/v1/clients/search?query=
pub async fn search_clients(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<SearchClientsQuery>,
) -> ApiResult<Vec<ClientSummary>> {
    claims.require_any(STAFF)?;
    let clients = state.clients.search_clients(&query.query).await?;
    Ok(ApiResponse::ok("Clients retrieved", clients))
}

/// GET /api/v1/clients/check-phone?phoneNumber=
pub async fn check_phone_number(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<CheckPhoneQuery>,
) -> ApiResult<PhoneCheck> {
    claims.require_any(STAFF)?;
    let found = state.clients.check_phone_number(&query.phone_number).await?;
    let message = if found.is_some() { "Phone number is registered" } else { "Phone number is available" };
    Ok(ApiResponse::ok(message, PhoneCheck::from(found)))
}

/// GET /api/v1/clients/stats
pub async fn client_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<ClientStats> {
    claims.require_any(STAFF)?;
    let stats = state.clients.client_stats(Utc::now()).await?;
    Ok(ApiResponse::ok("Client statistics retrieved", stats))
}

/// GET /api/v1/clients/:client_id
pub async fn get_client(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Client> {
    claims.require_any(STAFF)?;
    let client = state.clients.get_client(client_id(&id)?).await?;
    Ok(ApiResponse::ok("Client retrieved", client))
}

/// PUT /api/v1/clients/:client_id
pub async fn update_client(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<ClientUpdate>,
) -> ApiResult<ClientSummary> {
    claims.require_any(STAFF)?;
    let client = state.clients.update_client(client_id(&id)?, update).await?;
    Ok(ApiResponse::ok("Client updated successfully", client))
}

/// DELETE /api/v1/clients/:client_id
pub async fn delete_client(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<ClientSummary> {
    claims.require_any(STAFF)?;
    let client = state.clients.delete_client(client_id(&id)?).await?;
    Ok(ApiResponse::ok("Client deleted successfully", client))
}

/// Visits joined with their bills
///
/// GET /api/v1/clients/:client_id/history
pub async fn client_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<ClientHistory> {
    claims.require_any(STAFF)?;
    let history = state.clients.client_history(client_id(&id)?).await?;
    Ok(ApiResponse::ok("Client history retrieved", history))
}

/// POST /api/v1/clients/:client_id/visits
pub async fn add_visit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<AddVisitRequest>,
) -> Created<WithSideEffects<VisitRecorded>> {
    claims.require_any(STAFF)?;
    let outcome = state.clients.add_visit(client_id(&id)?, request.visit_data).await?;
    Ok(ApiResponse::created("Visit added successfully", outcome.into()))
}
