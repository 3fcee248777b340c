//! Application bootstrapper
//!
//! Handles all initialization and setup for the vm-manage service.

use std::sync::Arc;

use axum::Router;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::db;
use crate::endpoints;
use crate::services::{AzureProvider, Provisioner};
use crate::state::AppState;

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    // A missing .env file is fine; the process environment is used as-is
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_tracing(&config.log_level);

    tracing::info!("Starting vm-manage v{}", config.version);

    let state = init_services(&config).await?;
    let app = create_app(state);

    serve(app, &config).await
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("vm_manage={},tower_http={}", log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_ansi(false))
        .init();
}

/// Initialize all application services
async fn init_services(config: &Config) -> anyhow::Result<AppState> {
    let conn = db::connect(&config.database).await?;
    tracing::info!("Database connection established");

    let provider = AzureProvider::new(config.azure.clone())?;
    tracing::info!(
        "Azure provider ready for subscription {}",
        config.azure.subscription_id
    );

    let provisioner = Provisioner::new(Arc::new(provider), config.provisioning.clone());

    Ok(AppState::new(conn, provisioner))
}

/// Create the main application router
pub fn create_app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    endpoints::create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Start the HTTP server
async fn serve(app: Router, config: &Config) -> anyhow::Result<()> {
    let addr = config.server.bind_addr();
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
