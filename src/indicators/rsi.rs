// =============================================================================
// Relative Strength Index (RSI) - Wilder's Smoothing
// =============================================================================
//
// Step 1 - Price changes from consecutive closes; gain = max(change, 0),
//          loss = max(-change, 0).
// Step 2 - Seed average gain / average loss with the sums of the first
//          `period` gains / losses, divided by `period`.
// Step 3 - Wilder's smoothing for every change past the seed window:
//            avg_gain = (prev_avg_gain * (period - 1) + gain) / period
//            avg_loss = (prev_avg_loss * (period - 1) + loss) / period
// Step 4 - RS  = avg_gain / avg_loss
//          RSI = 100 - 100 / (1 + RS)
//
// When the caller sizes `period` to the whole series (the usual call shape,
// see `compute_rsi_full_window`) there are only `period - 1` changes; the seed
// still divides by `period`, and no smoothing step runs.
//
// Thresholds: RSI > 70 => overbought, RSI < 30 => oversold (strict).
// =============================================================================

use tracing::trace;

use crate::error::IndicatorError;
use crate::types::RsiSignal;

const OVERBOUGHT: f64 = 70.0;
const OVERSOLD: f64 = 30.0;

/// Compute the final RSI of `prices` using Wilder's smoothing over `period`.
///
/// # Errors
/// - `InvalidPeriod` when `period == 0`.
/// - `InsufficientData` when fewer than two prices are supplied.
/// - `NonFinite` when any price is NaN or infinite, or when the arithmetic
///   overflows (a price change or the final ratio leaves the finite range).
///
/// An average loss of exactly zero yields `100.0`, including a perfectly flat
/// series.
pub fn compute_rsi(prices: &[f64], period: usize) -> Result<f64, IndicatorError> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(period));
    }
    if prices.len() < 2 {
        return Err(IndicatorError::InsufficientData {
            len: prices.len(),
            required: 2,
        });
    }
    if let Some(index) = prices.iter().position(|p| !p.is_finite()) {
        return Err(IndicatorError::NonFinite { index });
    }

    let changes: Vec<f64> = prices.windows(2).map(|w| w[1] - w[0]).collect();
    if let Some(i) = changes.iter().position(|c| !c.is_finite()) {
        return Err(IndicatorError::NonFinite { index: i + 1 });
    }

    // --- Seed ----------------------------------------------------------------
    let seed_len = period.min(changes.len());
    let (sum_gain, sum_loss) = changes[..seed_len]
        .iter()
        .fold((0.0_f64, 0.0_f64), |(g, l), &c| (g + gain(c), l + loss(c)));

    let period_f = period as f64;
    let mut avg_gain = sum_gain / period_f;
    let mut avg_loss = sum_loss / period_f;

    // --- Wilder's smoothing --------------------------------------------------
    for &change in changes.iter().skip(period) {
        avg_gain = (avg_gain * (period_f - 1.0) + gain(change)) / period_f;
        avg_loss = (avg_loss * (period_f - 1.0) + loss(change)) / period_f;
    }

    let rsi = rsi_from_averages(avg_gain, avg_loss).ok_or(IndicatorError::NonFinite {
        index: prices.len() - 1,
    })?;
    trace!(
        points = prices.len(),
        period,
        avg_gain,
        avg_loss,
        rsi,
        "rsi computed"
    );
    Ok(rsi)
}

/// RSI with the smoothing period set to the length of the series, which is how
/// the chat commands request it ("RSI over the last N days").
pub fn compute_rsi_full_window(prices: &[f64]) -> Result<f64, IndicatorError> {
    compute_rsi(prices, prices.len().max(1))
}

/// Map an RSI value onto its momentum reading. 70 and 30 are both neutral.
pub fn interpret_rsi(value: f64) -> RsiSignal {
    if value > OVERBOUGHT {
        RsiSignal::Overbought
    } else if value < OVERSOLD {
        RsiSignal::Oversold
    } else {
        RsiSignal::Neutral
    }
}

// =============================================================================
// Internal helpers
// =============================================================================

#[inline]
fn gain(change: f64) -> f64 {
    change.max(0.0)
}

#[inline]
fn loss(change: f64) -> f64 {
    (-change).max(0.0)
}

/// Convert average gain / average loss into an RSI value in [0, 100].
///
/// - If average loss is zero, RSI is 100.0.
/// - Returns `None` when the result is non-finite (overflowed averages).
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    let rsi = if avg_loss == 0.0 {
        100.0
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    };

    if rsi.is_finite() {
        Some(rsi)
    } else {
        None
    }
}
