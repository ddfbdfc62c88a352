//! Mapping from service errors to HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use publishing_service::ServiceError;
use tracing::{error, warn};

#[derive(Debug, thiserror::Error)]
pub(crate) enum ApiError {
    #[error("{0}")]
    Unauthorized(&'static str),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl ApiError {
    pub(crate) fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Service(e) => match e {
                ServiceError::NotFound { .. } => StatusCode::NOT_FOUND,
                ServiceError::InvalidState { .. } | ServiceError::Validation { .. } => {
                    StatusCode::BAD_REQUEST
                }
                ServiceError::Conflict { .. } => StatusCode::CONFLICT,
                ServiceError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                ServiceError::AmbiguousResult { .. }
                | ServiceError::ExternalOperation { .. }
                | ServiceError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

/// Construct a JSON error response with the given status code and message.
pub(crate) fn json_error(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %self, "request failed");
            let message = match status {
                StatusCode::GATEWAY_TIMEOUT => "request timed out",
                _ => "internal server error",
            };
            return json_error(status, message);
        }
        warn!(status = status.as_u16(), error = %self, "request rejected");
        json_error(status, &self.to_string())
    }
}
