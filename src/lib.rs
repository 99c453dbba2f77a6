pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;

// Make test_utils available for both unit tests and integration tests
pub mod test_utils;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use backend::AuthBackend;
use config::{AppConfig, SessionLayer};
use services::{AuthService, DashboardService};
use session::SessionRegistry;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub dashboard_service: Arc<DashboardService>,
    pub registry: Arc<SessionRegistry>,
    pub config: AppConfig,
}

impl AppState {
    pub fn new(backend: Arc<dyn AuthBackend>, config: AppConfig) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(backend)),
            dashboard_service: Arc::new(DashboardService::new()),
            registry: Arc::new(SessionRegistry::new()),
            config,
        }
    }
}

/// All portal routes with their layers applied.
pub fn build_router(app_state: AppState, session_layer: SessionLayer) -> Router {
    let auth_routes = Router::new()
        .route(
            "/auth/login",
            get(auth::handlers::login_page).post(auth::handlers::login_handler),
        )
        .route(
            "/auth/signup",
            get(auth::handlers::signup_page).post(auth::handlers::signup_handler),
        )
        .route("/auth/logout", post(auth::handlers::logout_handler))
        .route(
            "/auth/reset-password",
            get(auth::handlers::reset_password_page).post(auth::handlers::reset_password_handler),
        )
        .route("/profile", post(auth::handlers::update_profile_handler));

    let dashboard_routes = Router::new()
        .route("/admin/dashboard", get(handlers::admin_dashboard_handler))
        .route("/admin/portal", get(handlers::admin_portal_handler))
        .route(
            "/customer/dashboard",
            get(handlers::customer_dashboard_handler),
        );

    Router::new()
        .route("/", get(handlers::index_handler))
        .route("/health", get(handlers::health_handler))
        .merge(auth_routes)
        .merge(dashboard_routes)
        .layer(session_layer)
        .layer(axum_middleware::from_fn(middleware::add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Evict session stores idle longer than `max_idle`, every `interval`.
pub fn spawn_registry_sweeper(
    registry: Arc<SessionRegistry>,
    interval: std::time::Duration,
    max_idle: std::time::Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = registry.prune_idle(max_idle).await;
            if removed > 0 {
                tracing::info!("Evicted {} idle session stores", removed);
            }
        }
    })
}
