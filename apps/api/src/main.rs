mod config;
mod errors;
mod models;
mod routes;
mod scheduler;
mod state;
mod tenant;
mod tenant_client;
mod transform;
mod views;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::routes::build_router;
use crate::state::AppState;
use crate::tenant::resolver::DetectionHints;
use crate::tenant_client::HttpTenantBackend;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting tenantd v{}", env!("CARGO_PKG_VERSION"));

    // Initialize tenant backend client
    let backend = HttpTenantBackend::new(
        config.tenant_api_url.clone(),
        config.tenant_api_token.clone(),
        config.tenant_api_timeout,
    )?;
    info!("Tenant backend client initialized ({})", config.tenant_api_url);

    // Build app state (composition root: one manager, one engine)
    let state = AppState::new(Arc::new(backend), &config);

    // Resolve the startup tenant; a failure is left on the context, not fatal
    match state.manager.initialize(&DetectionHints::default()).await {
        Ok(snapshot) => info!(
            "Tenant context initialized (tenant: {})",
            snapshot.context.slug().unwrap_or("none")
        ),
        Err(e) => warn!("Tenant context initialization failed: {e}"),
    }

    // Background refresh and health checks
    scheduler::spawn_auto_refresh(state.manager.clone(), config.refresh_interval);
    scheduler::spawn_health_monitor(state.views.clone(), config.health_interval);

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins to the tenant base domain

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
