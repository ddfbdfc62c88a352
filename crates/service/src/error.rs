use publishing_notify::NotifyError;
use publishing_relational::RelationalError;
use publishing_storage::{ProposalStatus, StorageError};

/// Errors returned by [`PublishingService`](crate::PublishingService)
/// operations. Every variant names the operation that failed.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{operation}: {what} not found")]
    NotFound {
        operation: &'static str,
        what: String,
    },

    /// A lookup expected to match one record matched several.
    #[error("{operation}: {what} matched {count} records")]
    AmbiguousResult {
        operation: &'static str,
        what: String,
        count: usize,
    },

    /// The proposal cannot take the requested step in its current state.
    #[error("{operation}: proposal {node_id} {reason}")]
    InvalidState {
        operation: &'static str,
        node_id: String,
        reason: String,
    },

    #[error("{operation}: {message}")]
    Validation {
        operation: &'static str,
        message: String,
    },

    /// The dataset provisioning composite operation failed.
    #[error("{operation}: external operation failed: {source}")]
    ExternalOperation {
        operation: &'static str,
        #[source]
        source: RelationalError,
    },

    #[error("{operation}: store error: {message}")]
    Store {
        operation: &'static str,
        message: String,
    },

    /// A conditional write lost a race with another writer.
    #[error("{operation}: proposal {node_id} was modified concurrently")]
    Conflict {
        operation: &'static str,
        node_id: String,
    },

    #[error("{operation}: timed out")]
    Timeout { operation: &'static str },
}

impl ServiceError {
    pub(crate) fn wrong_status(
        operation: &'static str,
        node_id: &str,
        actual: ProposalStatus,
        expected: ProposalStatus,
    ) -> Self {
        ServiceError::InvalidState {
            operation,
            node_id: node_id.to_string(),
            reason: format!("is {actual}, expected {expected}"),
        }
    }

    /// Client-caused errors (bad status, bad input) as opposed to
    /// infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServiceError::InvalidState { .. } | ServiceError::Validation { .. }
        )
    }

    pub fn operation(&self) -> &'static str {
        match self {
            ServiceError::NotFound { operation, .. }
            | ServiceError::AmbiguousResult { operation, .. }
            | ServiceError::InvalidState { operation, .. }
            | ServiceError::Validation { operation, .. }
            | ServiceError::ExternalOperation { operation, .. }
            | ServiceError::Store { operation, .. }
            | ServiceError::Conflict { operation, .. }
            | ServiceError::Timeout { operation } => *operation,
        }
    }
}

/// Attach the failing operation's name to a leaf error.
pub(crate) trait During<T> {
    fn during(self, operation: &'static str) -> Result<T, ServiceError>;
}

impl<T> During<T> for Result<T, StorageError> {
    fn during(self, operation: &'static str) -> Result<T, ServiceError> {
        self.map_err(|e| match e {
            StorageError::NotFound { collection, key } => ServiceError::NotFound {
                operation,
                what: format!("{collection} {key}"),
            },
            StorageError::Ambiguous {
                collection,
                key,
                count,
            } => ServiceError::AmbiguousResult {
                operation,
                what: format!("{collection} {key}"),
                count,
            },
            StorageError::Conflict { node_id, .. } | StorageError::AlreadyExists { node_id, .. } => {
                ServiceError::Conflict { operation, node_id }
            }
            StorageError::Backend(message) => ServiceError::Store { operation, message },
        })
    }
}

impl<T> During<T> for Result<T, RelationalError> {
    fn during(self, operation: &'static str) -> Result<T, ServiceError> {
        self.map_err(|e| match e {
            RelationalError::UserNotFound { user_id } => ServiceError::NotFound {
                operation,
                what: format!("user {user_id}"),
            },
            RelationalError::OrganizationNotFound { key } => ServiceError::NotFound {
                operation,
                what: format!("organization {key}"),
            },
            other => ServiceError::Store {
                operation,
                message: other.to_string(),
            },
        })
    }
}

/// Failure of the notification step. Never returned from a service
/// operation; logged and dropped by the caller.
#[derive(Debug, thiserror::Error)]
pub(crate) enum NotificationFailure {
    #[error("lookup failed: {0}")]
    Lookup(#[from] ServiceError),
    #[error(transparent)]
    Notify(#[from] NotifyError),
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),
}
