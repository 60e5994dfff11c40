// =============================================================================
// Error taxonomy
// =============================================================================
//
// `IndicatorError` is what the computation core surfaces; flat candles are not
// errors and never appear here. `ApiError` is the HTTP-facing wrapper that
// turns everything into a `{ "error": ... }` JSON body.
// =============================================================================

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;

/// Failures of the indicator core. Each variant is returned to the immediate
/// caller; the core never masks one into a numeric result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("insufficient data: got {len} values, need at least {required}")]
    InsufficientData { len: usize, required: usize },

    #[error("no data: the candle sequence is empty")]
    NoData,

    #[error("invalid period: {0} (must be at least 1)")]
    InvalidPeriod(usize),

    #[error("non-finite value at index {index}")]
    NonFinite { index: usize },

    #[error("timestamp {0} ms is outside the representable date range")]
    InvalidTimestamp(i64),
}

/// Rejected command parameters (lookback windows).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("The allowed range for days is between 1 and 14. Please adjust your input.")]
    RsiDaysOutOfRange,

    #[error("Invalid number of days! Please use 1, 7, or 14.")]
    InvalidBopDays,

    #[error("malformed window `{0}`")]
    MalformedWindow(String),
}

/// Unified error type for API responses.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Indicator(#[from] IndicatorError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error("{0}")]
    BadRequest(String),

    #[error("You're sending commands too quickly. Please wait a second and try again.")]
    RateLimited,

    #[error("missing caller identity")]
    MissingCaller,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Indicator(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Request(_) | Self::BadRequest(_) | Self::MissingCaller => StatusCode::BAD_REQUEST,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });
        (self.status(), axum::Json(body)).into_response()
    }
}
