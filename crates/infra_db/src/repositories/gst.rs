//! GST configuration repository
//!
//! Revisions are append-only. The primary key on `revision` rejects a second
//! writer racing for the same revision number.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const REVISION_COLUMNS: &str =
    "revision, gst_percentage, is_active, applied_to, updated_by, updated_by_name, created_at";

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct GstRevisionRow {
    pub revision: i64,
    pub gst_percentage: Decimal,
    pub is_active: bool,
    pub applied_to: String,
    pub updated_by: Uuid,
    pub updated_by_name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GstConfigRepository {
    pool: PgPool,
}

impl GstConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn latest(&self) -> Result<Option<GstRevisionRow>, DatabaseError> {
        let sql = format!(
            "SELECT {REVISION_COLUMNS} FROM gst_config_revisions ORDER BY revision DESC LIMIT 1"
        );
        let row = sqlx::query_as::<_, GstRevisionRow>(&sql)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    pub async fn append(&self, revision: &GstRevisionRow) -> Result<GstRevisionRow, DatabaseError> {
        let sql = format!(
            "INSERT INTO gst_config_revisions ({REVISION_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {REVISION_COLUMNS}"
        );
        let row = sqlx::query_as::<_, GstRevisionRow>(&sql)
            .bind(revision.revision)
            .bind(revision.gst_percentage)
            .bind(revision.is_active)
            .bind(&revision.applied_to)
            .bind(revision.updated_by)
            .bind(&revision.updated_by_name)
            .bind(revision.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match DatabaseError::from(e) {
                DatabaseError::DuplicateEntry(_) => {
                    DatabaseError::duplicate("GST configuration", "revision", revision.revision)
                }
                other => other,
            })?;
        Ok(row)
    }

    /// Revisions newest first
    pub async fn history(&self, limit: i64) -> Result<Vec<GstRevisionRow>, DatabaseError> {
        let sql = format!(
            "SELECT {REVISION_COLUMNS} FROM gst_config_revisions ORDER BY revision DESC LIMIT $1"
        );
        let rows = sqlx::query_as::<_, GstRevisionRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
