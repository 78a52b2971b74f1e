//! Notification repository
//!
//! A notification is addressed to a viewer when its `recipient_id` is the
//! viewer's id, or when it has no recipient id and its `recipient_type` is
//! one of the types covering the viewer's role.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const NOTIFICATION_COLUMNS: &str = "id, title, message, notification_type, recipient_type, \
     recipient_id, recipient_model, related_entity_type, related_entity_id, priority, \
     is_read, is_active, scheduled_for, sent_at, created_at, updated_at";

const ADDRESSED_CLAUSE: &str =
    "(recipient_id = $1 OR (recipient_id IS NULL AND recipient_type = ANY($2)))";

/// Filter clause; parameters `$1` to `$5` come from [`NotificationFilter`]
const VISIBLE_CLAUSE: &str = "is_active \
     AND (recipient_id = $1 OR (recipient_id IS NULL AND recipient_type = ANY($2))) \
     AND (sent_at IS NOT NULL OR scheduled_for IS NULL OR scheduled_for <= $3) \
     AND ($4::text IS NULL OR notification_type = $4) \
     AND ($5::boolean IS NULL OR is_read = $5)";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct NotificationRow {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub recipient_type: String,
    pub recipient_id: Option<Uuid>,
    pub recipient_model: String,
    pub related_entity_type: String,
    pub related_entity_id: Option<String>,
    pub priority: String,
    pub is_read: bool,
    pub is_active: bool,
    pub scheduled_for: Option<DateTime<Utc>>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A viewer's feed filter in storage form
#[derive(Debug, Clone)]
pub struct NotificationFilter {
    pub viewer_id: Uuid,
    /// Recipient types whose broadcasts the viewer sees
    pub broadcast_types: Vec<String>,
    pub now: DateTime<Utc>,
    pub notification_type: Option<String>,
    pub is_read: Option<bool>,
}

#[derive(Debug, Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn insert_sql() -> String {
        format!(
            "INSERT INTO notifications ({NOTIFICATION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) \
             RETURNING {NOTIFICATION_COLUMNS}"
        )
    }

    fn bind_insert<'q>(
        sql: &'q str,
        row: &'q NotificationRow,
    ) -> sqlx::query::QueryAs<'q, sqlx::Postgres, NotificationRow, sqlx::postgres::PgArguments> {
        sqlx::query_as::<_, NotificationRow>(sql)
            .bind(row.id)
            .bind(&row.title)
            .bind(&row.message)
            .bind(&row.notification_type)
            .bind(&row.recipient_type)
            .bind(row.recipient_id)
            .bind(&row.recipient_model)
            .bind(&row.related_entity_type)
            .bind(&row.related_entity_id)
            .bind(&row.priority)
            .bind(row.is_read)
            .bind(row.is_active)
            .bind(row.scheduled_for)
            .bind(row.sent_at)
            .bind(row.created_at)
            .bind(row.updated_at)
    }

    pub async fn insert(&self, row: &NotificationRow) -> Result<NotificationRow, DatabaseError> {
        let sql = Self::insert_sql();
        let inserted = Self::bind_insert(&sql, row).fetch_one(&self.pool).await?;
        Ok(inserted)
    }

    /// Inserts all rows or none
    pub async fn insert_many(&self, rows: &[NotificationRow]) -> Result<usize, DatabaseError> {
        let sql = Self::insert_sql();
        let mut tx = self.pool.begin().await?;
        for row in rows {
            Self::bind_insert(&sql, row).fetch_one(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    /// Visible notifications newest first, with the total match count
    pub async fn find(
        &self,
        filter: &NotificationFilter,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<NotificationRow>, i64), DatabaseError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications WHERE {VISIBLE_CLAUSE} \
             ORDER BY created_at DESC, id DESC LIMIT $6 OFFSET $7"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(filter.viewer_id)
            .bind(&filter.broadcast_types)
            .bind(filter.now)
            .bind(&filter.notification_type)
            .bind(filter.is_read)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        let total = self.count(filter).await?;
        Ok((rows, total))
    }

    pub async fn count(&self, filter: &NotificationFilter) -> Result<i64, DatabaseError> {
        let sql = format!("SELECT COUNT(*) FROM notifications WHERE {VISIBLE_CLAUSE}");
        let count = sqlx::query_scalar::<_, i64>(&sql)
            .bind(filter.viewer_id)
            .bind(&filter.broadcast_types)
            .bind(filter.now)
            .bind(&filter.notification_type)
            .bind(filter.is_read)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// An active notification addressed to the viewer, scheduled or not
    pub async fn find_addressed(
        &self,
        id: Uuid,
        viewer_id: Uuid,
        broadcast_types: &[String],
    ) -> Result<Option<NotificationRow>, DatabaseError> {
        let sql = format!(
            "SELECT {NOTIFICATION_COLUMNS} FROM notifications \
             WHERE id = $3 AND is_active AND {ADDRESSED_CLAUSE}"
        );
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(viewer_id)
            .bind(broadcast_types)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn mark_read(&self, id: Uuid, now: DateTime<Utc>) -> Result<NotificationRow, DatabaseError> {
        let sql = format!(
            "UPDATE notifications SET is_read = TRUE, updated_at = $2 WHERE id = $1 \
             RETURNING {NOTIFICATION_COLUMNS}"
        );
        sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(id)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Notification", id))
    }

    /// Marks every unread active notification addressed to the viewer
    pub async fn mark_all_read(
        &self,
        viewer_id: Uuid,
        broadcast_types: &[String],
        now: DateTime<Utc>,
    ) -> Result<u64, DatabaseError> {
        let sql = format!(
            "UPDATE notifications SET is_read = TRUE, updated_at = $3 \
             WHERE is_active AND NOT is_read AND {ADDRESSED_CLAUSE}"
        );
        let result = sqlx::query(&sql)
            .bind(viewer_id)
            .bind(broadcast_types)
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Soft delete
    pub async fn deactivate(&self, id: Uuid, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE notifications SET is_active = FALSE, updated_at = $2 WHERE id = $1")
            .bind(id)
            .bind(now)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Notification", id));
        }
        Ok(())
    }
}
