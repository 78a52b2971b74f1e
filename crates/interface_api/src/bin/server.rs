//! Salon billing API server
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin salon-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_JWT_SECRET=... DATABASE_URL=postgres://... cargo run --bin salon-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - Secret used to validate bearer tokens
//! * `API_JWT_EXPIRATION_SECS` - Lifetime of tokens minted by tooling (default: 3600)
//! * `API_DATABASE_URL` / `DATABASE_URL` - PostgreSQL connection string
//! * `API_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_LOG_LEVEL` - trace, debug, info, warn, error (default: info); `RUST_LOG` wins

use std::net::SocketAddr;

use anyhow::Context;
use infra_db::{create_pool, run_migrations, DatabaseConfig};
use interface_api::{config::ApiConfig, create_router, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config();
    init_tracing(&config.log_level);

    tracing::info!(host = %config.host, port = config.port, "Starting salon billing API server");

    let pool = create_pool(DatabaseConfig::new(&config.database_url).max_connections(config.max_connections))
        .await
        .context("connecting to the database")?;
    run_migrations(&pool).await.context("running migrations")?;

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid server address {}", config.server_addr()))?;
    let app = create_router(AppState::postgres(pool, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Reads `ApiConfig`, falling back to per-variable lookup when the layered
/// configuration cannot be built
fn load_config() -> ApiConfig {
    ApiConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Falling back to individual environment variables: {}", e);
        let defaults = ApiConfig::default();
        let var = |name: &str| std::env::var(name).ok();
        ApiConfig {
            host: var("API_HOST").unwrap_or(defaults.host),
            port: var("API_PORT").and_then(|p| p.parse().ok()).unwrap_or(defaults.port),
            jwt_secret: var("API_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_expiration_secs: var("API_JWT_EXPIRATION_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.jwt_expiration_secs),
            database_url: var("API_DATABASE_URL")
                .or_else(|| var("DATABASE_URL"))
                .unwrap_or(defaults.database_url),
            max_connections: var("API_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_connections),
            log_level: var("API_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    })
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => tracing::info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
