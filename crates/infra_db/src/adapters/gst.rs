//! PostgreSQL adapter for `GstConfigPort`

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, Percentage, PortError, StaffId};
use domain_billing::{GstConfig, GstConfigPort};

use crate::repositories::gst::{GstConfigRepository, GstRevisionRow};
use super::{parse_column, ping};

#[derive(Debug, Clone)]
pub struct PostgresGstConfigAdapter {
    repository: GstConfigRepository,
    pool: PgPool,
}

impl PostgresGstConfigAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: GstConfigRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresGstConfigAdapter {}

#[async_trait]
impl HealthCheckable for PostgresGstConfigAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-gst-config-adapter").await
    }
}

#[async_trait]
impl GstConfigPort for PostgresGstConfigAdapter {
    async fn current(&self) -> Result<Option<GstConfig>, PortError> {
        self.repository.latest().await?.map(to_config).transpose()
    }

    #[instrument(skip(self, config), fields(revision = config.revision))]
    async fn append(&self, config: GstConfig) -> Result<GstConfig, PortError> {
        let row = self.repository.append(&revision_row(&config)).await?;
        to_config(row)
    }

    async fn history(&self, limit: u32) -> Result<Vec<GstConfig>, PortError> {
        self.repository
            .history(i64::from(limit))
            .await?
            .into_iter()
            .map(to_config)
            .collect()
    }
}

fn revision_row(config: &GstConfig) -> GstRevisionRow {
    GstRevisionRow {
        revision: config.revision,
        gst_percentage: config.gst_percentage.value(),
        is_active: config.is_active,
        applied_to: config.applied_to.as_str().to_string(),
        updated_by: config.updated_by.into(),
        updated_by_name: config.updated_by_name.clone(),
        created_at: config.created_at,
    }
}

fn to_config(row: GstRevisionRow) -> Result<GstConfig, PortError> {
    Ok(GstConfig {
        revision: row.revision,
        gst_percentage: Percentage::new(row.gst_percentage)
            .map_err(|e| PortError::transformation(format!("column gst_percentage: {}", e)))?,
        is_active: row.is_active,
        applied_to: parse_column(&row.applied_to, "applied_to")?,
        updated_by: StaffId::from_uuid(row.updated_by),
        updated_by_name: row.updated_by_name,
        created_at: row.created_at,
    })
}
