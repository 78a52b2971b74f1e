//! Bill handlers

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use chrono::Utc;

use core_kernel::{BillId, ClientId, Page};
use domain_billing::{
    Bill, BillingStats, ClientBillingHistory, CreateBillRequest, PaymentUpdate, PrintableBill,
    ServiceSelectionRequest,
};

use super::parse_path;
use crate::auth::{roles, Claims};
use crate::extract::{ApiJson, ApiQuery};
use crate::dto::bills::{BillHistoryQuery, CancelBillRequest, SearchBillsQuery};
use crate::dto::{ApiResponse, ApiResult, Created, WithSideEffects};
use crate::AppState;

const STAFF: &[&str] = &[roles::MANAGER, roles::ADMIN];

/// Create a bill
///
/// POST /api/v1/bills/create
pub async fn create_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<CreateBillRequest>,
) -> Created<WithSideEffects<Bill>> {
    claims.require_any(STAFF)?;
    let outcome = state.billing.create_bill(request, claims.staff_id().ok()).await?;
    Ok(ApiResponse::created("Bill created successfully", outcome.into()))
}

/// Create a pending bill from selected services
///
/// POST /api/v1/bills/create-from-services
pub async fn create_from_services(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<ServiceSelectionRequest>,
) -> Created<WithSideEffects<Bill>> {
    claims.require_any(STAFF)?;
    let outcome = state.billing.create_from_services(request, claims.staff_id().ok()).await?;
    Ok(ApiResponse::created("Bill created successfully", outcome.into()))
}

/// GET /api/v1/bills/stats
pub async fn billing_stats(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<BillingStats> {
    claims.require_any(STAFF)?;
    let stats = state.billing.stats(Utc::now()).await?;
    Ok(ApiResponse::ok("Billing statistics retrieved", stats))
}

/// Search bills by client name or phone
///
/// GET /api/v1/bills/search/client
pub async fn search_bills(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<SearchBillsQuery>,
) -> ApiResult<Page<Bill>> {
    claims.require_any(STAFF)?;
    let (search, page) = query.into_search();
    let bills = state.billing.search_bills(search, page).await?;
    Ok(ApiResponse::ok("Bills retrieved", bills))
}

/// GET /api/v1/bills/number/:bill_number
pub async fn get_bill_by_number(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(bill_number): Path<String>,
) -> ApiResult<Bill> {
    claims.require_any(STAFF)?;
    let bill = state.billing.get_bill_by_number(&bill_number).await?;
    Ok(ApiResponse::ok("Bill retrieved", bill))
}

/// GET /api/v1/bills/client/:client_id/history
pub async fn client_billing_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(client_id): Path<String>,
    ApiQuery(query): ApiQuery<BillHistoryQuery>,
) -> ApiResult<ClientBillingHistory> {
    claims.require_any(STAFF)?;
    let client_id: ClientId = parse_path(&client_id, "client id")?;
    let history = state
        .billing
        .client_billing_history(client_id, query.status.as_deref(), query.page_request())
        .await?;
    Ok(ApiResponse::ok("Client billing history retrieved", history))
}

/// GET /api/v1/bills/:bill_id
pub async fn get_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(bill_id): Path<String>,
) -> ApiResult<Bill> {
    claims.require_any(STAFF)?;
    let bill = state.billing.get_bill(parse_path::<BillId>(&bill_id, "bill id")?).await?;
    Ok(ApiResponse::ok("Bill retrieved", bill))
}

/// GET /api/v1/bills/:bill_id/print
pub async fn printable_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(bill_id): Path<String>,
) -> ApiResult<PrintableBill> {
    claims.require_any(STAFF)?;
    let printable = state
        .billing
        .printable_bill(parse_path::<BillId>(&bill_id, "bill id")?)
        .await?;
    Ok(ApiResponse::ok("Printable bill generated", printable))
}

/// PUT /api/v1/bills/:bill_id/payment
pub async fn update_payment(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(bill_id): Path<String>,
    ApiJson(update): ApiJson<PaymentUpdate>,
) -> ApiResult<Bill> {
    claims.require_any(STAFF)?;
    let bill = state
        .billing
        .update_payment(parse_path::<BillId>(&bill_id, "bill id")?, update)
        .await?;
    Ok(ApiResponse::ok("Payment status updated", bill))
}

/// PUT /api/v1/bills/:bill_id/cancel
pub async fn cancel_bill(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(bill_id): Path<String>,
    body: Option<Json<CancelBillRequest>>,
) -> ApiResult<Bill> {
    claims.require_any(STAFF)?;
    let reason = body.and_then(|Json(b)| b.reason);
    let bill = state
        .billing
        .cancel_bill(parse_path::<BillId>(&bill_id, "bill id")?, reason.as_deref())
        .await?;
    Ok(ApiResponse::ok("Bill cancelled", bill))
}
