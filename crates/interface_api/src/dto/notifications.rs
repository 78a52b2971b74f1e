//! Notification DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{PageRequest, RecipientId};
use domain_notification::{
    CreateNotification, NotificationError, NotificationPayload, NotificationQuery, Priority,
    RecipientType, RelatedEntityType, Viewer,
};

use super::common::page_request;

/// Query of `GET /notifications`
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotificationsQuery {
    #[serde(rename = "type")]
    pub notification_type: Option<String>,
    pub is_read: Option<bool>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl ListNotificationsQuery {
    pub fn into_query(self, viewer: Viewer) -> Result<(NotificationQuery, PageRequest), NotificationError> {
        let mut query = NotificationQuery::for_viewer(viewer);
        query.notification_type = self.notification_type.as_deref().map(str::parse).transpose()?;
        query.is_read = self.is_read;
        Ok((query, page_request(self.page, self.limit, 20)))
    }
}

/// Body of `POST /notifications/create`
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateNotificationRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    #[serde(default, rename = "type")]
    #[validate(length(min = 1, message = "Type is required"))]
    pub notification_type: String,
    #[serde(default)]
    #[validate(length(min = 1, message = "Recipient type is required"))]
    pub recipient_type: String,
    pub recipient_id: Option<RecipientId>,
    pub priority: Option<String>,
    pub related_entity_type: Option<String>,
    #[serde(alias = "relatedId")]
    pub related_entity_id: Option<String>,
    pub scheduled_for: Option<DateTime<Utc>>,
}

impl CreateNotificationRequest {
    pub fn into_command(self) -> Result<CreateNotification, NotificationError> {
        let mut payload = NotificationPayload::new(self.title, self.message, self.notification_type.parse()?);
        if let Some(priority) = self.priority.as_deref() {
            payload = payload.with_priority(priority.parse::<Priority>()?);
        }
        if let Some(id) = self.related_entity_id {
            let entity_type = match self.related_entity_type.as_deref() {
                Some(kind) => kind.parse()?,
                None => RelatedEntityType::None,
            };
            payload = payload.related_to(entity_type, id);
        }
        payload.scheduled_for = self.scheduled_for;

        Ok(CreateNotification {
            payload,
            recipient_type: self.recipient_type.parse::<RecipientType>()?,
            recipient_id: self.recipient_id,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct UnreadCount {
    pub count: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkedRead {
    pub modified_count: u64,
}
