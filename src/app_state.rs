// =============================================================================
// Central Application State - Coin Lens
// =============================================================================
//
// Shared across every request handler and background task via `Arc<AppState>`.
//
// Thread safety:
//   - `parking_lot::RwLock` around the runtime config.
//   - The admission gate manages its own interior mutability.
//   - Atomic counters for lock-free request accounting.
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;

use crate::admission::{AdmissionGate, GateSnapshot};
use crate::runtime_config::RuntimeConfig;

pub struct AppState {
    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub gate: Arc<AdmissionGate>,
    /// Indicator computations that completed successfully.
    pub computations: AtomicU64,
    /// Indicator computations that ended in an `IndicatorError`.
    pub computation_failures: AtomicU64,
    pub start_time: Instant,
}

/// Health payload: uptime, gate occupancy and computation counters.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub uptime_secs: u64,
    pub computations: u64,
    pub computation_failures: u64,
    pub gate: GateSnapshot,
}

impl AppState {
    /// Build the state from `config`; the gate takes its interval and
    /// retention from it.
    pub fn new(config: RuntimeConfig) -> Self {
        let gate = AdmissionGate::with_retention(
            config.rate_limit_interval(),
            config.gate_retention(),
        );
        Self {
            runtime_config: Arc::new(RwLock::new(config)),
            gate: Arc::new(gate),
            computations: AtomicU64::new(0),
            computation_failures: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_computation<T, E>(&self, outcome: &Result<T, E>) {
        let counter = if outcome.is_ok() {
            &self.computations
        } else {
            &self.computation_failures
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn build_snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            uptime_secs: self.start_time.elapsed().as_secs(),
            computations: self.computations.load(Ordering::Relaxed),
            computation_failures: self.computation_failures.load(Ordering::Relaxed),
            gate: self.gate.snapshot(),
        }
    }
}
