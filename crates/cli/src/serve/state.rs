//! Application state shared across request handlers.

use std::future::Future;
use std::time::Duration;

use publishing_service::{PublishingService, ServiceError};

use super::error::ApiError;

pub(crate) struct AppState {
    pub(crate) service: PublishingService,
    /// Optional API key for authentication. None = no auth required.
    pub(crate) api_key: Option<String>,
    request_timeout: Duration,
}

impl AppState {
    pub(crate) fn new(
        service: PublishingService,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Self {
        Self {
            service,
            api_key,
            request_timeout,
        }
    }

    /// Run one service operation under the request deadline.
    pub(crate) async fn within<T, F>(&self, operation: &'static str, call: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<T, ServiceError>>,
    {
        match tokio::time::timeout(self.request_timeout, call).await {
            Ok(result) => result.map_err(ApiError::from),
            Err(_) => Err(ApiError::from(ServiceError::Timeout { operation })),
        }
    }
}
