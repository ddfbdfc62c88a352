use async_trait::async_trait;
use publishing_storage::{DatasetProposalRecord, RepositoryRecord};

use crate::error::RelationalError;
use crate::record::{CreatedDataset, Organization, Publisher, User};

/// Lookups and mutations against the organization/user/dataset schema.
///
/// Implementations must be `Send + Sync + 'static` so they can be shared
/// across request tasks as `Arc<dyn RelationalStore>`.
#[async_trait]
pub trait RelationalStore: Send + Sync + 'static {
    /// Returns `Err(RelationalError::UserNotFound)` if no such user exists.
    async fn get_proposal_user(&self, user_id: i64) -> Result<User, RelationalError>;

    /// The organization backing `repository`.
    async fn get_repository_workspace(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Organization, RelationalError>;

    /// Members of the repository's publishing team. May be empty.
    async fn get_publishing_team(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Vec<Publisher>, RelationalError>;

    /// The workspace new dataset owners are pointed to in their acceptance email.
    async fn get_welcome_workspace(&self) -> Result<Organization, RelationalError>;

    /// Provision the dataset for an accepted proposal.
    ///
    /// Runs every [`ProvisionStep`](crate::ProvisionStep) in order inside one
    /// transaction. If any step fails nothing is committed and the error
    /// is `RelationalError::StepFailed` naming that step.
    async fn create_dataset_for_accepted_proposal(
        &self,
        proposal: &DatasetProposalRecord,
    ) -> Result<CreatedDataset, RelationalError>;
}
