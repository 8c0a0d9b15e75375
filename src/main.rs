//! farm-gateway server entry point.
//!
//! Loads configuration, opens the store, and serves the REST API until
//! Ctrl-C.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use farm_gateway::api;
use farm_gateway::app_state::AppState;
use farm_gateway::config::GatewayConfig;
use farm_gateway::persistence::{
    self, FarmStore, MemoryStore, PgFarmStore, PgPondStore, PgTelemetryStore, PondStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env().map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(
        service = %config.service_name,
        addr = %config.listen_addr,
        "starting farm-gateway"
    );

    // Build persistence and service layers
    let state = if config.persistence_enabled {
        let pool = persistence::connect(&config)
            .await
            .context("failed to connect to PostgreSQL")?;
        tracing::info!("using PostgreSQL stores");
        AppState::new(
            Arc::new(PgFarmStore::new(pool.clone())),
            Arc::new(PgPondStore::new(pool.clone())),
            Arc::new(PgTelemetryStore::new(pool)),
            config.request_timeout(),
        )
    } else {
        tracing::warn!("persistence disabled, data is kept in memory only");
        let store = Arc::new(MemoryStore::new());
        AppState::new(
            Arc::clone(&store) as Arc<dyn FarmStore>,
            Arc::clone(&store) as Arc<dyn PondStore>,
            store,
            config.request_timeout(),
        )
    };

    let app = api::build_app(state.with_service_name(config.service_name.clone()));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
