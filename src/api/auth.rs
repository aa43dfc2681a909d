//! API key check for the JSON API
//!
//! Only the `/api/v1` routes are guarded; the HTML upload page is served to
//! browsers without a key. The layer is installed only when
//! [`ServerConfig::api_key`](crate::config::ServerConfig::api_key) is set.

use crate::error::ApiError;
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Header carrying the key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Reject requests whose `X-Api-Key` header does not equal `expected`
///
/// ```no_run
/// use axum::{Router, middleware};
/// use rawconv::api::auth::require_api_key;
/// use std::sync::Arc;
///
/// let key: Arc<str> = Arc::from("secret-key-123");
/// let router: Router = Router::new()
///     .layer(middleware::from_fn_with_state(key, require_api_key));
/// ```
pub async fn require_api_key(
    State(expected): State<Arc<str>>,
    request: Request,
    next: Next,
) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());

    match provided {
        Some(key) if constant_time_eq(key.as_bytes(), expected.as_bytes()) => {
            next.run(request).await
        }
        Some(_) => {
            tracing::warn!(uri = %request.uri(), "rejected request with invalid API key");
            unauthorized("Invalid API key")
        }
        None => unauthorized("Missing X-Api-Key header"),
    }
}

/// Compare every byte so the time taken does not reveal the mismatch position
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn unauthorized(message: &str) -> Response {
    (StatusCode::UNAUTHORIZED, Json(ApiError::unauthorized(message))).into_response()
}
