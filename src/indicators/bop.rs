// =============================================================================
// Balance of Power (BOP) - daily aggregation
// =============================================================================
//
// Per candle:  BOP = (close - open) / (high - low),  nominally in [-1, 1].
//
// Candles with high == low are skipped (no range, no direction). The remaining
// values are averaged per UTC calendar day. A day made only of flat candles is
// absent from the result rather than reported as 0.
// =============================================================================

use tracing::{debug, trace};

use crate::error::IndicatorError;
use crate::indicators::bucket::DailyBuckets;
use crate::types::{Candle, DailyBop, Pressure};

/// BOP of a single candle, or `None` for a flat candle.
pub fn candle_bop(candle: &Candle) -> Option<f64> {
    if candle.is_flat() {
        return None;
    }
    Some((candle.close - candle.open) / (candle.high - candle.low))
}

/// Average BOP per UTC day over `candles`, ascending by date.
///
/// # Errors
/// - `NoData` when `candles` is empty. A non-empty input made solely of flat
///   candles is *not* an error and returns an empty vec.
/// - `NonFinite` when any OHLC field is NaN or infinite, or when a candle's
///   BOP overflows.
/// - `InvalidTimestamp` when a timestamp cannot be mapped to a date.
pub fn aggregate_bop(candles: &[Candle]) -> Result<Vec<DailyBop>, IndicatorError> {
    if candles.is_empty() {
        return Err(IndicatorError::NoData);
    }

    let mut buckets = DailyBuckets::new();
    let mut skipped = 0usize;

    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_finite() {
            return Err(IndicatorError::NonFinite { index });
        }
        match candle_bop(candle) {
            Some(bop) if !bop.is_finite() => {
                return Err(IndicatorError::NonFinite { index });
            }
            Some(bop) => {
                buckets.push(candle.timestamp_ms, bop)?;
            }
            None => {
                skipped += 1;
                trace!(index, timestamp_ms = candle.timestamp_ms, "flat candle skipped");
            }
        }
    }

    let result: Vec<DailyBop> = buckets
        .into_means()
        .into_iter()
        .map(|(date, value)| DailyBop { date, value })
        .collect();

    debug!(
        candles = candles.len(),
        skipped_flat = skipped,
        days = result.len(),
        "bop aggregated"
    );

    Ok(result)
}

/// Strictly positive BOP is buy pressure; zero counts as sell pressure.
pub fn classify_pressure(value: f64) -> Pressure {
    if value > 0.0 {
        Pressure::Buy
    } else {
        Pressure::Sell
    }
}
