use bsm_portal::{
    backend,
    config::{validate_production_config, AppConfig, BackendConfig, SessionConfig},
    build_router, spawn_registry_sweeper, AppState,
};
use tower_sessions::MemoryStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bsm_portal=debug,tower_http=debug,axum::rejection=trace".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    validate_production_config()?;

    let config = AppConfig::from_env()?;
    let backend_config = BackendConfig::from_env();
    let auth_backend = backend::from_config(&backend_config, &config.site_url);

    let app_state = AppState::new(auth_backend, config.clone());

    let session_config = SessionConfig::from_env();
    let session_layer = session_config.create_layer(MemoryStore::default());

    spawn_registry_sweeper(
        app_state.registry.clone(),
        config.registry_sweep_interval,
        session_config.idle_limit(),
    );

    let app = build_router(app_state, session_layer);

    let addr = config.socket_addr();
    tracing::info!("Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
