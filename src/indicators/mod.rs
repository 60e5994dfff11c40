// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free indicator computations. Every public function returns
// `Result<_, IndicatorError>` so callers must handle insufficient data and the
// numerical edge cases; no I/O or clock access happens here.

pub mod bop;
pub mod bucket;
pub mod rsi;

pub use bop::{aggregate_bop, classify_pressure};
pub use rsi::{compute_rsi_full_window, interpret_rsi};
