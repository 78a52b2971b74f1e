//! PostgreSQL adapter for `NotificationPort`

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use core_kernel::{
    DomainPort, HealthCheckResult, HealthCheckable, NotificationId, Page, PageRequest, PortError,
    RecipientId,
};
use domain_notification::{
    Notification, NotificationPort, NotificationQuery, RecipientType, Viewer,
};

use crate::repositories::notification::{NotificationFilter, NotificationRepository, NotificationRow};
use super::{parse_column, ping, unsigned};

#[derive(Debug, Clone)]
pub struct PostgresNotificationAdapter {
    repository: NotificationRepository,
    pool: PgPool,
}

impl PostgresNotificationAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: NotificationRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresNotificationAdapter {}

#[async_trait]
impl HealthCheckable for PostgresNotificationAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-notification-adapter").await
    }
}

#[async_trait]
impl NotificationPort for PostgresNotificationAdapter {
    #[instrument(skip(self, notifications), fields(count = notifications.len()))]
    async fn insert_many(&self, notifications: Vec<Notification>) -> Result<usize, PortError> {
        let rows: Vec<NotificationRow> = notifications.iter().map(notification_row).collect();
        let inserted = self.repository.insert_many(&rows).await?;
        debug!(inserted, "Notifications stored");
        Ok(inserted)
    }

    async fn insert(&self, notification: Notification) -> Result<Notification, PortError> {
        let row = self.repository.insert(&notification_row(&notification)).await?;
        to_notification(row)
    }

    async fn find(&self, query: &NotificationQuery, page: PageRequest) -> Result<Page<Notification>, PortError> {
        let (rows, total) = self
            .repository
            .find(&filter(query), i64::from(page.limit), page.offset() as i64)
            .await?;
        let items = rows
            .into_iter()
            .map(to_notification)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page::new(items, unsigned(total, "count")?, page))
    }

    async fn count_unread(&self, query: &NotificationQuery) -> Result<u64, PortError> {
        let unread = filter(&query.clone().read_state(false));
        unsigned(self.repository.count(&unread).await?, "count")
    }

    async fn find_for_viewer(
        &self,
        id: NotificationId,
        viewer: &Viewer,
    ) -> Result<Option<Notification>, PortError> {
        self.repository
            .find_addressed(id.into(), viewer.id.into(), &broadcast_types(viewer))
            .await?
            .map(to_notification)
            .transpose()
    }

    #[instrument(skip(self), fields(notification_id = %id))]
    async fn mark_read(&self, id: NotificationId) -> Result<Notification, PortError> {
        let row = self.repository.mark_read(id.into(), Utc::now()).await?;
        to_notification(row)
    }

    #[instrument(skip(self), fields(viewer_id = %viewer.id))]
    async fn mark_all_read(&self, viewer: &Viewer) -> Result<u64, PortError> {
        Ok(self
            .repository
            .mark_all_read(viewer.id.into(), &broadcast_types(viewer), Utc::now())
            .await?)
    }

    #[instrument(skip(self), fields(notification_id = %id))]
    async fn deactivate(&self, id: NotificationId) -> Result<(), PortError> {
        Ok(self.repository.deactivate(id.into(), Utc::now()).await?)
    }
}

/// Recipient types whose role-wide broadcasts reach the viewer
fn broadcast_types(viewer: &Viewer) -> Vec<String> {
    let Some(role) = viewer.role else {
        return Vec::new();
    };
    [RecipientType::Admin, RecipientType::Manager, RecipientType::Both]
        .into_iter()
        .filter(|t| t.includes(role))
        .map(|t| t.as_str().to_string())
        .collect()
}

fn filter(query: &NotificationQuery) -> NotificationFilter {
    NotificationFilter {
        viewer_id: query.viewer.id.into(),
        broadcast_types: broadcast_types(&query.viewer),
        now: query.now,
        notification_type: query.notification_type.map(|t| t.as_str().to_string()),
        is_read: query.is_read,
    }
}

fn notification_row(notification: &Notification) -> NotificationRow {
    NotificationRow {
        id: notification.id.into(),
        title: notification.title.clone(),
        message: notification.message.clone(),
        notification_type: notification.notification_type.as_str().to_string(),
        recipient_type: notification.recipient_type.as_str().to_string(),
        recipient_id: notification.recipient_id.map(Uuid::from),
        recipient_model: notification.recipient_model.as_str().to_string(),
        related_entity_type: notification.related_entity_type.as_str().to_string(),
        related_entity_id: notification.related_entity_id.clone(),
        priority: notification.priority.as_str().to_string(),
        is_read: notification.is_read,
        is_active: notification.is_active,
        scheduled_for: notification.scheduled_for,
        sent_at: notification.sent_at,
        created_at: notification.created_at,
        updated_at: notification.updated_at,
    }
}

fn to_notification(row: NotificationRow) -> Result<Notification, PortError> {
    Ok(Notification {
        id: NotificationId::from_uuid(row.id),
        title: row.title,
        message: row.message,
        notification_type: parse_column(&row.notification_type, "notification_type")?,
        recipient_type: parse_column(&row.recipient_type, "recipient_type")?,
        recipient_id: row.recipient_id.map(RecipientId::from_uuid),
        recipient_model: parse_column(&row.recipient_model, "recipient_model")?,
        related_entity_type: parse_column(&row.related_entity_type, "related_entity_type")?,
        related_entity_id: row.related_entity_id,
        priority: parse_column(&row.priority, "priority")?,
        is_read: row.is_read,
        is_active: row.is_active,
        scheduled_for: row.scheduled_for,
        sent_at: row.sent_at,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
