// =============================================================================
// ChartForge — Main Entry Point
// =============================================================================
//
// Backend for the stock-charting dashboard: serves assembled chart bundles
// (price series + technical indicators + axis layout) over REST, preferring
// server-computed indicator data from the upstream market-data API and
// falling back to the local indicator engine per indicator.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod chart;
mod datasource;
mod indicators;
mod market_data;
mod runtime_config;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::RuntimeConfig;

/// Default path of the persisted runtime configuration.
const CONFIG_PATH: &str = "chartforge.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Environment overrides for containerized deployments.
    if let Ok(url) = std::env::var("CHARTFORGE_UPSTREAM_URL") {
        config.upstream_base_url = url;
    }
    if let Ok(key) = std::env::var("CHARTFORGE_UPSTREAM_API_KEY") {
        if !key.is_empty() {
            config.upstream_api_key = Some(key);
        }
    }

    info!(
        upstream = %config.upstream_base_url,
        api_key_configured = config.upstream_api_key.is_some(),
        default_interval = %config.default_interval,
        "ChartForge starting up"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Start the API server ──────────────────────────────────────────
    let bind_addr =
        std::env::var("CHARTFORGE_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());

    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {bind_addr}: {e}"))?;
    info!(addr = %bind_addr, "API server listening");

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "API server failed");
        }
    });

    // ── 4. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");
    server.abort();

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("ChartForge shut down complete.");
    Ok(())
}
