// =============================================================================
// Shared types used across the Coin Lens indicator service
// =============================================================================
//
// Upstream market-data providers ship samples as bare JSON arrays
// (`[ts, price]` and `[ts, open, high, low, close]`), so the wire shape of
// `PricePoint` and `Candle` is the tuple form rather than an object.
// =============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// =============================================================================
// Market samples
// =============================================================================

/// A single price observation. Sequences are ascending by timestamp; duplicate
/// timestamps are kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(i64, f64)", into = "(i64, f64)")]
pub struct PricePoint {
    pub timestamp_ms: i64,
    pub price: f64,
}

impl From<(i64, f64)> for PricePoint {
    fn from((timestamp_ms, price): (i64, f64)) -> Self {
        Self { timestamp_ms, price }
    }
}

impl From<PricePoint> for (i64, f64) {
    fn from(p: PricePoint) -> Self {
        (p.timestamp_ms, p.price)
    }
}

/// One OHLC sample as received from the provider. Immutable once received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(i64, f64, f64, f64, f64)",
    into = "(i64, f64, f64, f64, f64)"
)]
pub struct Candle {
    pub timestamp_ms: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

impl Candle {
    pub fn new(timestamp_ms: i64, open: f64, high: f64, low: f64, close: f64) -> Self {
        Self {
            timestamp_ms,
            open,
            high,
            low,
            close,
        }
    }

    /// A flat candle has no high-low range and carries no directional signal.
    pub fn is_flat(&self) -> bool {
        self.high == self.low
    }

    pub fn is_finite(&self) -> bool {
        self.open.is_finite() && self.high.is_finite() && self.low.is_finite() && self.close.is_finite()
    }
}

impl From<(i64, f64, f64, f64, f64)> for Candle {
    fn from((ts, open, high, low, close): (i64, f64, f64, f64, f64)) -> Self {
        Self::new(ts, open, high, low, close)
    }
}

impl From<Candle> for (i64, f64, f64, f64, f64) {
    fn from(c: Candle) -> Self {
        (c.timestamp_ms, c.open, c.high, c.low, c.close)
    }
}

// =============================================================================
// Caller identity
// =============================================================================

/// Opaque identity of whoever is issuing requests (chat user id, API key,
/// peer address...). Only equality and hashing matter to the admission gate.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallerId(pub String);

impl CallerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[cfg(test)]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CallerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CallerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// =============================================================================
// Indicator outputs
// =============================================================================

/// Momentum reading derived from an RSI value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiSignal {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiSignal {
    /// Long-form explanation suitable for a chat reply.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Overbought => {
                "Overbought - The asset might be overvalued and could be due for a correction."
            }
            Self::Oversold => {
                "Oversold - The asset might be undervalued and could be due for an increase."
            }
            Self::Neutral => "Neutral - The asset is in a balanced state.",
        }
    }
}

impl std::fmt::Display for RsiSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overbought => write!(f, "Overbought"),
            Self::Oversold => write!(f, "Oversold"),
            Self::Neutral => write!(f, "Neutral"),
        }
    }
}

/// Direction of a daily Balance of Power reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pressure {
    Buy,
    Sell,
}

impl std::fmt::Display for Pressure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Buy => write!(f, "Buy Pressure"),
            Self::Sell => write!(f, "Sell Pressure"),
        }
    }
}

/// Mean BOP over every non-flat candle of one UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyBop {
    /// Serialises as `YYYY-MM-DD`.
    pub date: NaiveDate,
    pub value: f64,
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candle_deserialises_from_provider_tuple() {
        let c: Candle = serde_json::from_str("[1700000000000, 10.0, 20.0, 10.0, 15.0]").unwrap();
        assert_eq!(c, Candle::new(1_700_000_000_000, 10.0, 20.0, 10.0, 15.0));
        assert!(!c.is_flat());
    }

    #[test]
    fn price_point_deserialises_from_pair() {
        let p: Vec<PricePoint> = serde_json::from_str("[[1, 2.5], [2, 3.0]]").unwrap();
        assert_eq!(p.len(), 2);
        assert_eq!(p[1].timestamp_ms, 2);
        assert!((p[0].price - 2.5).abs() < f64::EPSILON);
    }

    #[test]
    fn daily_bop_date_serialises_as_iso_day() {
        let d = DailyBop {
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            value: 0.5,
        };
        let json = serde_json::to_value(d).unwrap();
        assert_eq!(json["date"], "2024-03-09");
    }

    #[test]
    fn signal_labels() {
        assert_eq!(serde_json::to_value(RsiSignal::Overbought).unwrap(), "overbought");
        assert_eq!(Pressure::Sell.to_string(), "Sell Pressure");
        assert!(RsiSignal::Neutral.description().starts_with("Neutral"));
    }

    #[test]
    fn non_finite_candle_detected() {
        assert!(!Candle::new(0, f64::NAN, 1.0, 0.0, 1.0).is_finite());
        assert!(Candle::new(0, 1.0, 1.0, 1.0, 1.0).is_flat());
    }
}
