// =============================================================================
// REST API Endpoints - Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`. Health is public and bypasses the
// admission gate. The indicator endpoints resolve a `Caller`, go through the
// gate, validate the lookback window and only then run the computation.
//
// The market data itself arrives in the request body, already extracted from
// the upstream provider by the front-end.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::caller::Caller;
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::indicators::{aggregate_bop, classify_pressure, compute_rsi_full_window, interpret_rsi};
use crate::request::{BopWindow, RsiWindow};
use crate::types::{Candle, CallerId, Pressure, PricePoint, RsiSignal};

// =============================================================================
// Router construction
// =============================================================================

/// Build the REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        // ── Admission-gated ─────────────────────────────────────────
        .route("/api/v1/rsi", post(rsi))
        .route("/api/v1/bop", post(bop))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Shared guards
// =============================================================================

fn admit(state: &AppState, caller: &CallerId) -> Result<(), ApiError> {
    if state.gate.try_admit_now(caller) {
        Ok(())
    } else {
        Err(ApiError::RateLimited)
    }
}

fn check_size(state: &AppState, len: usize) -> Result<(), ApiError> {
    let max = state.runtime_config.read().max_request_points;
    if len > max {
        return Err(ApiError::BadRequest(format!(
            "too many data points: {len} (max {max})"
        )));
    }
    Ok(())
}

// =============================================================================
// Health (public)
// =============================================================================

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "server_time": chrono::Utc::now().timestamp_millis(),
        "state": state.build_snapshot(),
    }))
}

// =============================================================================
// RSI
// =============================================================================

#[derive(Deserialize)]
struct RsiRequest {
    symbol: String,
    /// `Nd`, defaults to one day.
    #[serde(default)]
    window: Option<String>,
    prices: Vec<PricePoint>,
}

#[derive(Serialize)]
struct RsiResponse {
    request_id: Uuid,
    symbol: String,
    days: u32,
    points: usize,
    rsi: f64,
    signal: RsiSignal,
    description: &'static str,
}

async fn rsi(
    Caller(caller): Caller,
    State(state): State<Arc<AppState>>,
    Json(req): Json<RsiRequest>,
) -> Result<Json<RsiResponse>, ApiError> {
    admit(&state, &caller)?;
    let window = match req.window.as_deref() {
        Some(raw) => RsiWindow::parse(raw)?,
        None => RsiWindow::default(),
    };
    check_size(&state, req.prices.len())?;

    let closes: Vec<f64> = req.prices.iter().map(|p| p.price).collect();
    let outcome = compute_rsi_full_window(&closes);
    state.record_computation(&outcome);
    let value = outcome.map_err(|e| {
        warn!(caller = %caller, symbol = %req.symbol, error = %e, "rsi computation failed");
        e
    })?;

    let signal = interpret_rsi(value);
    let resp = RsiResponse {
        request_id: Uuid::new_v4(),
        symbol: req.symbol.to_uppercase(),
        days: window.days,
        points: closes.len(),
        rsi: value,
        signal,
        description: signal.description(),
    };
    info!(
        request_id = %resp.request_id,
        caller = %caller,
        symbol = %resp.symbol,
        rsi = value,
        signal = %signal,
        "rsi served"
    );
    Ok(Json(resp))
}

// =============================================================================
// BOP
// =============================================================================

#[derive(Deserialize)]
struct BopRequest {
    symbol: String,
    window: String,
    candles: Vec<Candle>,
}

#[derive(Serialize)]
struct BopBucket {
    date: chrono::NaiveDate,
    value: f64,
    pressure: Pressure,
}

#[derive(Serialize)]
struct BopResponse {
    request_id: Uuid,
    symbol: String,
    days: u32,
    buckets: Vec<BopBucket>,
}

async fn bop(
    Caller(caller): Caller,
    State(state): State<Arc<AppState>>,
    Json(req): Json<BopRequest>,
) -> Result<Json<BopResponse>, ApiError> {
    admit(&state, &caller)?;
    let window = BopWindow::parse(&req.window)?;
    check_size(&state, req.candles.len())?;

    let outcome = aggregate_bop(&req.candles);
    state.record_computation(&outcome);
    let daily = outcome.map_err(|e| {
        warn!(caller = %caller, symbol = %req.symbol, error = %e, "bop aggregation failed");
        e
    })?;

    let buckets: Vec<BopBucket> = daily
        .into_iter()
        .map(|d| BopBucket {
            date: d.date,
            value: d.value,
            pressure: classify_pressure(d.value),
        })
        .collect();

    let resp = BopResponse {
        request_id: Uuid::new_v4(),
        symbol: req.symbol.to_uppercase(),
        days: window.days,
        buckets,
    };
    info!(
        request_id = %resp.request_id,
        caller = %caller,
        symbol = %resp.symbol,
        days = resp.buckets.len(),
        "bop served"
    );
    Ok(Json(resp))
}

// =============================================================================
// Tests
// =============================================================================
