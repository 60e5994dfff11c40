// =============================================================================
// Command windows - lookback arguments of the /rsi and /bop commands
// =============================================================================
//
// Validated right after admission and before any market data is fetched, so a
// bad argument is answered without touching the upstream provider.
// =============================================================================

use serde::Serialize;

use crate::error::RequestError;

const RSI_MAX_DAYS: u32 = 14;

/// Lookback for an RSI request, written `Nd` with `1 <= N <= 14`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RsiWindow {
    pub days: u32,
}

impl RsiWindow {
    /// Parse `"7d"`-style input. Anything without a `d` suffix (e.g. `"1h"`)
    /// falls back to a single day.
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let raw = raw.trim();
        let Some(digits) = raw.strip_suffix('d') else {
            return Ok(Self::default());
        };
        let days: i64 = digits
            .parse()
            .map_err(|_| RequestError::MalformedWindow(raw.to_string()))?;
        if !(1..=RSI_MAX_DAYS as i64).contains(&days) {
            return Err(RequestError::RsiDaysOutOfRange);
        }
        Ok(Self { days: days as u32 })
    }
}

impl Default for RsiWindow {
    fn default() -> Self {
        Self { days: 1 }
    }
}

/// Lookback for a BOP request: exactly 1, 7 or 14 days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BopWindow {
    pub days: u32,
}

impl BopWindow {
    pub fn parse(raw: &str) -> Result<Self, RequestError> {
        let days = match raw.trim() {
            "1" => 1,
            "7" => 7,
            "14" => 14,
            _ => return Err(RequestError::InvalidBopDays),
        };
        Ok(Self { days })
    }
}
