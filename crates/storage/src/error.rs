use crate::record::ProposalStatus;

/// All errors that can be returned by a document store implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A single-item lookup matched no record.
    #[error("{collection} not found: {key}")]
    NotFound { collection: String, key: String },

    /// A single-item lookup matched more than one record.
    #[error("{collection} lookup for {key} returned {count} records, expected one")]
    Ambiguous {
        collection: String,
        key: String,
        count: usize,
    },

    /// A proposal with this (user_id, node_id) key already exists.
    #[error("dataset proposal already exists: {user_id}/{node_id}")]
    AlreadyExists { user_id: i64, node_id: String },

    /// Conditional write rejected: the stored proposal no longer has the
    /// status the caller read before deciding to write.
    #[error(
        "concurrent conflict on dataset proposal {user_id}/{node_id}: expected status {expected}"
    )]
    Conflict {
        user_id: i64,
        node_id: String,
        expected: ProposalStatus,
    },

    /// A backend-specific storage error (connection, serialization, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl StorageError {
    pub(crate) fn proposal_not_found(user_id: i64, node_id: &str) -> Self {
        StorageError::NotFound {
            collection: "dataset proposal".to_string(),
            key: format!("{user_id}/{node_id}"),
        }
    }
}
