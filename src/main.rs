// =============================================================================
// Coin Lens - Main Entry Point
// =============================================================================
//
// Hosts the indicator core (RSI, daily Balance of Power) behind a small HTTP
// API, with a per-caller admission gate in front of every computation.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod admission;
mod api;
mod app_state;
mod error;
mod indicators;
mod request;
mod runtime_config;
mod types;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::runtime_config::{RuntimeConfig, CONFIG_PATH};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Coin Lens starting up");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });
    config.apply_env_overrides();

    info!(
        bind_addr = %config.bind_addr,
        rate_limit_interval_ms = config.rate_limit_interval_ms,
        gate_retention_secs = config.gate_retention().as_secs(),
        "Configuration resolved"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let sweep_every = config.gate_sweep_interval();
    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState::new(config));

    // ── 3. Admission table sweeper ───────────────────────────────────────
    let gate = state.gate.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_every);
        loop {
            interval.tick().await;
            gate.sweep(Instant::now());
        }
    });

    // ── 4. API server ────────────────────────────────────────────────────
    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind API server on {bind_addr}"))?;
    info!(addr = %bind_addr, "API server listening");

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for shutdown signal");
        }
        warn!("Shutdown signal received, stopping gracefully");
    });

    server.await.context("API server failed")?;

    let snapshot = state.build_snapshot();
    info!(
        computations = snapshot.computations,
        failures = snapshot.computation_failures,
        admitted = snapshot.gate.admitted_total,
        rejected = snapshot.gate.rejected_total,
        "Coin Lens shut down complete"
    );
    Ok(())
}
