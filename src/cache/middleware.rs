//! Axum middleware wrapping read-only endpoints with the response cache.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{Method, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::state::AppState;

use super::store::CachedResponse;

/// Serves GET requests from the cache when possible; on a miss, runs the
/// handler and stores its 200 response keyed by path (+ query string).
/// Non-GET requests and non-200 responses pass through untouched.
pub async fn cache_middleware(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    if req.method() != Method::GET {
        return next.run(req).await;
    }

    let key = match req.uri().query() {
        Some(query) => format!("{}?{}", req.uri().path(), query),
        None => req.uri().path().to_string(),
    };

    if let Some(hit) = state.cache.get(&key) {
        tracing::debug!(key = %key, "response cache hit");
        return (
            StatusCode::OK,
            [(header::CONTENT_TYPE, hit.content_type)],
            hit.body,
        )
            .into_response();
    }

    let response = next.run(req).await;
    if response.status() != StatusCode::OK {
        return response;
    }

    let (parts, body) = response.into_parts();
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("failed to buffer response body for caching: {}", e);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let content_type = parts
        .headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/json")
        .to_string();

    state.cache.set(
        key,
        CachedResponse {
            content_type,
            body: bytes.clone(),
        },
    );

    Response::from_parts(parts, Body::from(bytes))
}
