// =============================================================================
// Caller Identity - Axum extractor
// =============================================================================
//
// Resolves who is calling so the admission gate can key on it:
//
//   1. the `X-Caller-Id` header (set by the chat front-end to the user id),
//   2. otherwise the peer IP address, when the server was started with
//      connect info.
//
// Requests carrying neither are rejected with 400 before the handler runs.
//
//   async fn handler(Caller(id): Caller, ...) { ... }
// =============================================================================

use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;

use crate::error::ApiError;
use crate::types::CallerId;

pub const CALLER_HEADER: &str = "x-caller-id";

/// Longest header value accepted as an identity.
const MAX_CALLER_ID_LEN: usize = 128;

pub struct Caller(pub CallerId);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(CALLER_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        if let Some(id) = header {
            if id.len() > MAX_CALLER_ID_LEN {
                warn!(len = id.len(), "oversized caller id header");
                return Err(ApiError::BadRequest(format!(
                    "{CALLER_HEADER} must be at most {MAX_CALLER_ID_LEN} bytes"
                )));
            }
            return Ok(Caller(CallerId::new(id)));
        }

        if let Some(ConnectInfo(addr)) = parts.extensions.get::<ConnectInfo<SocketAddr>>() {
            return Ok(Caller(CallerId::new(addr.ip().to_string())));
        }

        warn!("request without caller identity");
        Err(ApiError::MissingCaller)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(req: Request<()>) -> Result<Caller, ApiError> {
        let (mut parts, _) = req.into_parts();
        Caller::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn header_wins() {
        let req = Request::builder()
            .header(CALLER_HEADER, " 12345 ")
            .body(())
            .unwrap();
        let Caller(id) = extract(req).await.ok().unwrap();
        assert_eq!(id.as_str(), "12345");
    }

    #[tokio::test]
    async fn falls_back_to_peer_ip() {
        let mut req = Request::builder().body(()).unwrap();
        let addr: SocketAddr = "10.0.0.7:55555".parse().unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));
        let Caller(id) = extract(req).await.ok().unwrap();
        assert_eq!(id.as_str(), "10.0.0.7");
    }

    #[tokio::test]
    async fn missing_identity_rejected() {
        let req = Request::builder().header(CALLER_HEADER, "  ").body(()).unwrap();
        assert!(matches!(extract(req).await, Err(ApiError::MissingCaller)));
    }

    #[tokio::test]
    async fn oversized_identity_rejected() {
        let req = Request::builder()
            .header(CALLER_HEADER, "x".repeat(MAX_CALLER_ID_LEN + 1))
            .body(())
            .unwrap();
        assert!(matches!(extract(req).await, Err(ApiError::BadRequest(_))));
    }
}
