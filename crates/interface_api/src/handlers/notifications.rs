//! Notification handlers
//!
//! Every route acts on the caller's own feed, resolved from the token.

use axum::{
    extract::{Path, State},
    Extension,
};
use validator::Validate;

use core_kernel::NotificationId;
use domain_notification::{Delivery, Notification, NotificationFeed};

use super::parse_path;
use crate::auth::{roles, Claims};
use crate::extract::{ApiJson, ApiQuery};
use crate::dto::notifications::{CreateNotificationRequest, ListNotificationsQuery, MarkedRead, UnreadCount};
use crate::dto::{ApiResponse, ApiResult, Created};
use crate::AppState;

/// GET /api/v1/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiQuery(query): ApiQuery<ListNotificationsQuery>,
) -> ApiResult<NotificationFeed> {
    let (query, page) = query.into_query(claims.viewer()?)?;
    let feed = state.notifications.list(query, page).await?;
    Ok(ApiResponse::ok("Notifications retrieved", feed))
}

/// GET /api/v1/notifications/count
pub async fn unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<UnreadCount> {
    let count = state.notifications.unread_count(claims.viewer()?).await?;
    Ok(ApiResponse::ok("Unread count retrieved", UnreadCount { count }))
}

/// PUT /api/v1/notifications/mark-all-read
pub async fn mark_all_as_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> ApiResult<MarkedRead> {
    let modified_count = state.notifications.mark_all_as_read(claims.viewer()?).await?;
    Ok(ApiResponse::ok("All notifications marked as read", MarkedRead { modified_count }))
}

/// PUT /api/v1/notifications/:id/read
pub async fn mark_as_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<Notification> {
    let id: NotificationId = parse_path(&id, "notification id")?;
    let notification = state.notifications.mark_as_read(id, claims.viewer()?).await?;
    Ok(ApiResponse::ok("Notification marked as read", notification))
}

/// DELETE /api/v1/notifications/:id
pub async fn delete_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    let id: NotificationId = parse_path(&id, "notification id")?;
    state.notifications.delete(id, claims.viewer()?).await?;
    Ok(ApiResponse::message("Notification deleted successfully"))
}

/// Targeted when `recipientId` is given, broadcast otherwise
///
/// POST /api/v1/notifications/create
pub async fn create_notification(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiJson(request): ApiJson<CreateNotificationRequest>,
) -> Created<Delivery> {
    claims.require_any(&[roles::ADMIN])?;
    request.validate()?;
    let delivery = state.notifications.create_notification(request.into_command()?).await?;
    Ok(ApiResponse::created("Notification created successfully", delivery))
}
