//! PostgreSQL adapter for `RecipientDirectory`

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use core_kernel::{DomainPort, HealthCheckResult, HealthCheckable, PortError, RecipientId};
use domain_notification::{RecipientDirectory, StaffRole};

use crate::repositories::staff::StaffRepository;
use super::ping;

/// Resolves notification recipients from the staff tables
#[derive(Debug, Clone)]
pub struct PostgresStaffDirectory {
    repository: StaffRepository,
    pool: PgPool,
}

impl PostgresStaffDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: StaffRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresStaffDirectory {}

#[async_trait]
impl HealthCheckable for PostgresStaffDirectory {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-staff-directory").await
    }
}

fn recipients(ids: Vec<Uuid>) -> Vec<RecipientId> {
    ids.into_iter().map(RecipientId::from_uuid).collect()
}

#[async_trait]
impl RecipientDirectory for PostgresStaffDirectory {
    async fn role_accounts(&self, role: StaffRole) -> Result<Vec<RecipientId>, PortError> {
        let ids = match role {
            StaffRole::Admin => self.repository.admin_ids().await?,
            StaffRole::Manager => self.repository.manager_ids().await?,
        };
        Ok(recipients(ids))
    }

    async fn active_employees(&self, role: StaffRole) -> Result<Vec<RecipientId>, PortError> {
        let ids = self.repository.active_employee_ids(role.as_str()).await?;
        Ok(recipients(ids))
    }
}
