//! HTTP middleware: shared API key authentication.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::Response;

use super::error::json_error;
use super::state::AppState;

/// API key authentication middleware.
///
/// If `PUBLISHING_API_KEY` is set, all requests (except /health) must include
/// either `Authorization: Bearer <key>` or `X-API-Key: <key>`.
pub(crate) async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(expected_key) = &state.api_key else {
        return next.run(request).await;
    };

    // Load balancer health checks carry no key.
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let rejection = {
        let header = |name: &str| request.headers().get(name).and_then(|v| v.to_str().ok());
        let presented = header("authorization")
            .and_then(|auth| auth.strip_prefix("Bearer "))
            .or_else(|| header("x-api-key"));

        match presented {
            Some(key) if key == expected_key => None,
            Some(_) => Some((StatusCode::FORBIDDEN, "invalid API key")),
            None => Some((StatusCode::UNAUTHORIZED, "authentication required")),
        }
    };

    match rejection {
        None => next.run(request).await,
        Some((status, message)) => json_error(status, message),
    }
}
