//! HTTP API Layer
//!
//! REST surface of the salon billing backend, built on Axum.
//!
//! # Architecture
//!
//! - **Handlers**: one module per domain (bills, clients, GST, notifications)
//! - **Middleware**: JWT authentication and request audit logging
//! - **DTOs**: request bodies, query strings and the `{success, message, data}` envelope
//! - **Error Handling**: `ApiError` maps domain errors onto status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::postgres(pool, config);
//! let app = create_router(state);
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;
pub mod extract;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post, put},
    middleware as axum_middleware,
};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;
use tower_http::cors::{CorsLayer, Any};

use core_kernel::HealthCheckable;
use domain_billing::{BillLedgerFacts, BillPort, BillingService, GstConfigPort, GstService};
use domain_client::{ClientLedger, ClientPort};
use domain_notification::{NotificationFanout, NotificationPort, RecipientDirectory};
use infra_db::{
    PostgresBillAdapter, PostgresClientAdapter, PostgresGstConfigAdapter,
    PostgresNotificationAdapter, PostgresStaffDirectory,
};

use crate::config::ApiConfig;
use crate::middleware::{auth_middleware, audit_middleware};
use crate::handlers::{bills, clients, gst, health, notifications};

/// Storage behind the services
pub struct Ports {
    pub bills: Arc<dyn BillPort>,
    pub clients: Arc<dyn ClientPort>,
    pub gst: Arc<dyn GstConfigPort>,
    pub notifications: Arc<dyn NotificationPort>,
    pub recipients: Arc<dyn RecipientDirectory>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub billing: Arc<BillingService>,
    pub gst: Arc<GstService>,
    pub clients: Arc<ClientLedger>,
    pub notifications: Arc<NotificationFanout>,
    pub health_checks: Vec<Arc<dyn HealthCheckable>>,
}

impl AppState {
    /// Wires the services over the given ports
    pub fn new(config: ApiConfig, ports: Ports) -> Self {
        let notifications = Arc::new(NotificationFanout::new(ports.notifications, ports.recipients));
        let facts = Arc::new(BillLedgerFacts::new(ports.bills.clone()));
        let clients = Arc::new(ClientLedger::new(ports.clients, facts, notifications.clone()));
        let gst = Arc::new(GstService::new(ports.gst));
        let billing = Arc::new(BillingService::new(ports.bills, gst.clone(), clients.clone()));

        Self {
            config,
            billing,
            gst,
            clients,
            notifications,
            health_checks: Vec::new(),
        }
    }

    /// Wires the services over the PostgreSQL adapters
    pub fn postgres(pool: PgPool, config: ApiConfig) -> Self {
        let bills = Arc::new(PostgresBillAdapter::new(pool.clone()));
        let clients = Arc::new(PostgresClientAdapter::new(pool.clone()));
        let gst = Arc::new(PostgresGstConfigAdapter::new(pool.clone()));
        let notifications = Arc::new(PostgresNotificationAdapter::new(pool.clone()));
        let recipients = Arc::new(PostgresStaffDirectory::new(pool));

        let health_checks: Vec<Arc<dyn HealthCheckable>> = vec![
            bills.clone(),
            clients.clone(),
            gst.clone(),
            notifications.clone(),
            recipients.clone(),
        ];

        let ports = Ports { bills, clients, gst, notifications, recipients };
        Self { health_checks, ..Self::new(config, ports) }
    }

    pub fn with_health_check(mut self, check: Arc<dyn HealthCheckable>) -> Self {
        self.health_checks.push(check);
        self
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let bill_routes = Router::new()
        .route("/create", post(bills::create_bill))
        .route("/create-from-services", post(bills::create_from_services))
        .route("/stats", get(bills::billing_stats))
        .route("/search/client", get(bills::search_bills))
        .route("/number/:bill_number", get(bills::get_bill_by_number))
        .route("/client/:client_id/history", get(bills::client_billing_history))
        .route("/:bill_id", get(bills::get_bill))
        .route("/:bill_id/print", get(bills::printable_bill))
        .route("/:bill_id/payment", put(bills::update_payment))
        .route("/:bill_id/cancel", put(bills::cancel_bill));

    let client_routes = Router::new()
        .route("/add", post(clients::add_client))
        .route("/", get(clients::list_clients))
        .route("/search", get(clients::search_clients))
        .route("/check-phone", get(clients::check_phone_number))
        .route("/stats", get(clients::client_stats))
        .route(
            "/:client_id",
            get(clients::get_client)
                .put(clients::update_client)
                .delete(clients::delete_client),
        )
        .route("/:client_id/history", get(clients::client_history))
        .route("/:client_id/visits", post(clients::add_visit));

    let gst_routes = Router::new()
        .route("/config", get(gst::get_config).put(gst::update_config))
        .route("/history", get(gst::config_history))
        .route("/billing", get(gst::for_billing))
        .route("/calculate", post(gst::calculate));

    let notification_routes = Router::new()
        .route("/", get(notifications::list_notifications))
        .route("/count", get(notifications::unread_count))
        .route("/mark-all-read", put(notifications::mark_all_as_read))
        .route("/create", post(notifications::create_notification))
        .route("/:id/read", put(notifications::mark_as_read))
        .route("/:id", axum::routing::delete(notifications::delete_notification));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/bills", bill_routes)
        .nest("/clients", client_routes)
        .nest("/gst", gst_routes)
        .nest("/notifications", notification_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
