//! Database Test Utilities
//!
//! A PostgreSQL testcontainer with the workspace migrations applied, for the
//! ignored adapter integration tests.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;
use testcontainers::{
    core::{IntoContainerPort, WaitFor},
    runners::AsyncRunner,
    ContainerAsync, GenericImage, ImageExt,
};
use tokio::sync::OnceCell;

use infra_db::{create_pool, run_migrations, DatabaseConfig};

const POSTGRES_IMAGE: &str = "postgres";
const POSTGRES_TAG: &str = "16-alpine";
const POSTGRES_USER: &str = "test_user";
const POSTGRES_PASSWORD: &str = "test_password";
const POSTGRES_DB: &str = "salon_test";

/// Tables cleared between tests, children first
const TABLES: &[&str] = &[
    "client_visits",
    "clients",
    "bills",
    "gst_config_revisions",
    "notifications",
    "employees",
    "managers",
    "admins",
];

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Debug, Clone)]
pub struct TestDatabaseConfig {
    pub user: String,
    pub password: String,
    pub database: String,
    pub host: String,
    pub port: u16,
}

impl Default for TestDatabaseConfig {
    fn default() -> Self {
        Self {
            user: POSTGRES_USER.to_string(),
            password: POSTGRES_PASSWORD.to_string(),
            database: POSTGRES_DB.to_string(),
            host: "localhost".to_string(),
            port: 5432,
        }
    }
}

impl TestDatabaseConfig {
    pub fn connection_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user, self.password, self.host, self.port, self.database
        )
    }
}

/// A running PostgreSQL container and a pool connected to it
pub struct TestDatabase {
    _container: ContainerAsync<GenericImage>,
    pub config: TestDatabaseConfig,
    pub pool: PgPool,
}

impl TestDatabase {
    /// Starts a container and applies every migration
    pub async fn new() -> TestResult<Self> {
        let container = GenericImage::new(POSTGRES_IMAGE, POSTGRES_TAG)
            .with_exposed_port(5432.tcp())
            .with_wait_for(WaitFor::message_on_stderr("database system is ready to accept connections"))
            .with_env_var("POSTGRES_USER", POSTGRES_USER)
            .with_env_var("POSTGRES_PASSWORD", POSTGRES_PASSWORD)
            .with_env_var("POSTGRES_DB", POSTGRES_DB)
            .start()
            .await?;

        let config = TestDatabaseConfig {
            host: container.get_host().await?.to_string(),
            port: container.get_host_port_ipv4(5432).await?,
            ..TestDatabaseConfig::default()
        };

        let pool = create_pool(
            DatabaseConfig::new(config.connection_url())
                .max_connections(5)
                .connect_timeout(Duration::from_secs(30)),
        )
        .await?;
        run_migrations(&pool).await?;

        Ok(Self {
            _container: container,
            config,
            pool,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Empties every table and restarts the client code sequence
    pub async fn clear_data(&self) -> TestResult<()> {
        for table in TABLES {
            sqlx::query(&format!("TRUNCATE TABLE {} CASCADE", table))
                .execute(&self.pool)
                .await?;
        }
        sqlx::query("ALTER SEQUENCE client_code_seq RESTART WITH 1")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Inserts an admin account and returns its id
    pub async fn seed_admin(&self, name: &str) -> TestResult<uuid::Uuid> {
        let id = uuid::Uuid::now_v7();
        sqlx::query("INSERT INTO admins (id, name, email) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(format!("{}@salon.test", id.simple()))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Inserts a manager account and returns its id
    pub async fn seed_manager(&self, name: &str) -> TestResult<uuid::Uuid> {
        let id = uuid::Uuid::now_v7();
        sqlx::query("INSERT INTO managers (id, name, email) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(format!("{}@salon.test", id.simple()))
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    /// Inserts an employee holding `role` and returns its id
    pub async fn seed_employee(&self, name: &str, role: &str, is_active: bool) -> TestResult<uuid::Uuid> {
        let id = uuid::Uuid::now_v7();
        sqlx::query("INSERT INTO employees (id, name, role, is_active) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(name)
            .bind(role)
            .bind(is_active)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }
}

static SHARED_TEST_DB: OnceCell<Arc<TestDatabase>> = OnceCell::const_new();

/// A database shared by every test in the process
///
/// # Panics
///
/// Panics if the container cannot be started
pub async fn get_shared_test_database() -> Arc<TestDatabase> {
    SHARED_TEST_DB
        .get_or_init(|| async {
            Arc::new(
                TestDatabase::new()
                    .await
                    .expect("Failed to create shared test database"),
            )
        })
        .await
        .clone()
}

/// A database of its own, for tests that need isolation
pub async fn create_isolated_test_database() -> TestResult<TestDatabase> {
    TestDatabase::new().await
}

/// Declares an ignored test running against its own database
#[macro_export]
macro_rules! db_test {
    ($name:ident, |$db:ident| $body:block) => {
        #[tokio::test]
        #[ignore = "requires docker"]
        async fn $name() {
            let $db = $crate::database::create_isolated_test_database()
                .await
                .expect("Failed to create test database");
            $body
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_connection_url() {
        let url = TestDatabaseConfig::default().connection_url();
        assert!(url.starts_with("postgres://"));
        assert!(url.contains(POSTGRES_USER));
        assert!(url.ends_with(POSTGRES_DB));
    }

    #[test]
    fn test_tables_clear_children_first() {
        let visits = TABLES.iter().position(|t| *t == "client_visits");
        let clients = TABLES.iter().position(|t| *t == "clients");
        assert!(visits < clients);
    }
}
