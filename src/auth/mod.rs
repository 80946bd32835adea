//! PSK-based authentication for the admin API.
//!
//! Keys are compared in constant time. Public website routes bypass this layer.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::errors::{codes, ErrorDetails, ErrorResponse};
use crate::AppState;

/// Header name for the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware guarding `/api/*`. Without a configured key every request passes (dev mode).
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.config.api_psk.as_deref() else {
        return next.run(request).await;
    };

    match presented_key(request.headers()) {
        Some(key) if keys_match(key, expected) => next.run(request).await,
        Some(_) => {
            tracing::debug!(path = %request.uri().path(), "rejected request with wrong API key");
            unauthorized_response("Invalid API key")
        }
        None => unauthorized_response("Missing or invalid API key"),
    }
}

/// The key a client presented, from `x-api-key` or a bearer token.
fn presented_key(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.strip_prefix("Bearer "))
        })
}

fn keys_match(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

fn unauthorized_response(message: &str) -> Response {
    let body = ErrorResponse {
        success: false,
        error: ErrorDetails {
            code: codes::UNAUTHORIZED.to_string(),
            message: message.to_string(),
            details: None,
        },
        revision_id: 0,
    };

    (StatusCode::UNAUTHORIZED, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_keys_match() {
        assert!(keys_match("club-key-1", "club-key-1"));
        assert!(!keys_match("club-key-1", "club-key-2"));
        assert!(!keys_match("short", "much-longer-key"));
        assert!(keys_match("", ""));
    }

    #[test]
    fn test_presented_key_prefers_api_key_header() {
        let mut headers = HeaderMap::new();
        headers.insert(API_KEY_HEADER, HeaderValue::from_static("from-header"));
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-bearer"),
        );
        assert_eq!(presented_key(&headers), Some("from-header"));
    }

    #[test]
    fn test_presented_key_from_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-bearer"),
        );
        assert_eq!(presented_key(&headers), Some("from-bearer"));

        let mut basic = HeaderMap::new();
        basic.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
        assert_eq!(presented_key(&basic), None);
    }
}
