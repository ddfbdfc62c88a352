use async_trait::async_trait;

use crate::error::StorageError;
use crate::record::{
    DatasetProposalRecord, InfoRecord, ProposalKey, ProposalStatus, QuestionRecord,
    RepositoryRecord,
};

/// Read access to general publishing information documents.
#[async_trait]
pub trait InfoStore: Send + Sync + 'static {
    /// All information documents, in no particular order.
    async fn get_publishing_info(&self) -> Result<Vec<InfoRecord>, StorageError>;
}

/// Read access to publishing repositories.
#[async_trait]
pub trait RepositoryStore: Send + Sync + 'static {
    /// All repositories, in no particular order.
    async fn get_repositories(&self) -> Result<Vec<RepositoryRecord>, StorageError>;

    /// The repository backed by the organization with `organization_node_id`.
    ///
    /// Returns `Err(StorageError::NotFound)` when no repository matches and
    /// `Err(StorageError::Ambiguous)` when more than one does.
    async fn get_repository(
        &self,
        organization_node_id: &str,
    ) -> Result<RepositoryRecord, StorageError>;
}

/// Read access to survey questions.
#[async_trait]
pub trait QuestionStore: Send + Sync + 'static {
    async fn get_questions(&self) -> Result<Vec<QuestionRecord>, StorageError>;
}

/// Durable storage for dataset proposals.
///
/// ## Keys and indexes
///
/// A proposal is identified by `(user_id, node_id)`. Workspace-scoped
/// queries go through the `(organization_node_id, proposal_status)` and
/// `(repository_id, proposal_status)` indexes.
///
/// ## Conditional writes
///
/// [`ProposalStore::update_dataset_proposal_if`] replaces a record only when
/// the stored status still equals `expected`. Two callers racing the same
/// transition therefore cannot both succeed: the loser receives
/// `Err(StorageError::Conflict)`.
#[async_trait]
pub trait ProposalStore: Send + Sync + 'static {
    /// Fetch a single proposal by primary key.
    ///
    /// Returns `Err(StorageError::NotFound)` if no record exists.
    async fn get_dataset_proposal(
        &self,
        user_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, StorageError>;

    /// All proposals owned by `user_id`, regardless of status.
    async fn get_dataset_proposals_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<DatasetProposalRecord>, StorageError>;

    /// All proposals targeting the workspace `organization_node_id` that are
    /// currently in `status`.
    async fn get_dataset_proposals_for_workspace(
        &self,
        organization_node_id: &str,
        status: ProposalStatus,
    ) -> Result<Vec<DatasetProposalRecord>, StorageError>;

    /// The single proposal with `node_id` submitted to `repository_id` that is
    /// currently in `status`.
    ///
    /// Returns `Err(StorageError::NotFound)` when nothing matches and
    /// `Err(StorageError::Ambiguous)` when more than one record does.
    async fn get_dataset_proposal_for_repository(
        &self,
        repository_id: i64,
        status: ProposalStatus,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, StorageError>;

    /// Insert a new proposal.
    ///
    /// Returns `Err(StorageError::AlreadyExists)` if the key is taken.
    async fn create_dataset_proposal(
        &self,
        record: &DatasetProposalRecord,
    ) -> Result<(), StorageError>;

    /// Unconditionally replace an existing proposal.
    ///
    /// Returns `Err(StorageError::NotFound)` if no record has this key.
    async fn update_dataset_proposal(
        &self,
        record: &DatasetProposalRecord,
    ) -> Result<(), StorageError>;

    /// Replace an existing proposal only if its stored status is `expected`.
    ///
    /// Returns `Err(StorageError::NotFound)` if the record is gone and
    /// `Err(StorageError::Conflict)` if its status has moved on.
    async fn update_dataset_proposal_if(
        &self,
        record: &DatasetProposalRecord,
        expected: ProposalStatus,
    ) -> Result<(), StorageError>;

    /// Delete a proposal. Deleting a missing key is not an error.
    async fn delete_dataset_proposal(&self, key: &ProposalKey) -> Result<(), StorageError>;
}

/// Every collection the publishing service reads or writes.
///
/// Blanket-implemented for any type implementing the four collection traits,
/// so a backend only implements those and can be shared as
/// `Arc<dyn PublishingStore>`.
pub trait PublishingStore: InfoStore + RepositoryStore + QuestionStore + ProposalStore {}

impl<T> PublishingStore for T where T: InfoStore + RepositoryStore + QuestionStore + ProposalStore {}
