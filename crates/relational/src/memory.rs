//! In-process relational store for development and tests.
//!
//! Provisioning works on a staged copy of the directory and only swaps it in
//! once every step succeeds, so a failure at any step leaves no trace.

use std::collections::BTreeSet;

use async_trait::async_trait;
use publishing_storage::{DatasetProposalRecord, RepositoryRecord};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{ProvisionStep, RelationalError};
use crate::record::{CreatedDataset, Dataset, Organization, Publisher, User};
use crate::traits::RelationalStore;

/// Initial contents for a [`MemoryDirectory`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DirectorySeed {
    pub users: Vec<User>,
    pub organizations: Vec<Organization>,
    pub publishers: Vec<Publisher>,
    /// Organization that receives datasets for accepted proposals.
    pub publishing_organization_id: i64,
    pub welcome_workspace_slug: String,
}

/// A dataset contributor row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContributorRow {
    pub id: i64,
    pub user_id: i64,
}

#[derive(Debug, Clone, Default)]
struct Directory {
    users: Vec<User>,
    organizations: Vec<Organization>,
    publishers: Vec<Publisher>,
    memberships: BTreeSet<(i64, i64)>,
    datasets: Vec<Dataset>,
    contributors: Vec<ContributorRow>,
    dataset_contributors: BTreeSet<(i64, i64)>,
    dataset_owners: BTreeSet<(i64, i64)>,
    next_id: i64,
}

impl Directory {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct MemoryDirectory {
    inner: RwLock<Directory>,
    publishing_organization_id: i64,
    welcome_slug: String,
    fail_at: RwLock<Option<ProvisionStep>>,
}

impl MemoryDirectory {
    pub fn new(seed: DirectorySeed) -> Self {
        Self {
            inner: RwLock::new(Directory {
                users: seed.users,
                organizations: seed.organizations,
                publishers: seed.publishers,
                ..Default::default()
            }),
            publishing_organization_id: seed.publishing_organization_id,
            welcome_slug: seed.welcome_workspace_slug,
            fail_at: RwLock::new(None),
        }
    }

    /// Make the next provisioning runs fail at `step`. `None` clears it.
    pub async fn fail_at(&self, step: Option<ProvisionStep>) {
        *self.fail_at.write().await = step;
    }

    pub async fn datasets(&self) -> Vec<Dataset> {
        self.inner.read().await.datasets.clone()
    }

    pub async fn is_member(&self, organization_id: i64, user_id: i64) -> bool {
        self.inner
            .read()
            .await
            .memberships
            .contains(&(organization_id, user_id))
    }

    pub async fn is_owner(&self, dataset_id: i64, user_id: i64) -> bool {
        self.inner
            .read()
            .await
            .dataset_owners
            .contains(&(dataset_id, user_id))
    }

    pub async fn contributors(&self) -> Vec<ContributorRow> {
        self.inner.read().await.contributors.clone()
    }

    fn organization_by<'a>(
        dir: &'a Directory,
        pred: impl Fn(&Organization) -> bool,
    ) -> Option<&'a Organization> {
        dir.organizations.iter().find(|&o| pred(o))
    }

    fn provision(
        &self,
        staged: &mut Directory,
        proposal: &DatasetProposalRecord,
        fail_at: Option<ProvisionStep>,
    ) -> Result<CreatedDataset, RelationalError> {
        let check = |step: ProvisionStep| -> Result<(), RelationalError> {
            if fail_at == Some(step) {
                return Err(RelationalError::step(step, "injected failure"));
            }
            Ok(())
        };

        check(ProvisionStep::ResolveUser)?;
        let user = staged
            .users
            .iter()
            .find(|u| u.id == proposal.user_id)
            .cloned()
            .ok_or_else(|| {
                RelationalError::step(
                    ProvisionStep::ResolveUser,
                    format!("user {} does not exist", proposal.user_id),
                )
            })?;

        check(ProvisionStep::ResolveOrganization)?;
        let organization =
            Self::organization_by(staged, |o| o.id == self.publishing_organization_id)
                .cloned()
                .ok_or_else(|| {
                    RelationalError::step(
                        ProvisionStep::ResolveOrganization,
                        format!(
                            "organization {} does not exist",
                            self.publishing_organization_id
                        ),
                    )
                })?;

        check(ProvisionStep::AddGuestMembership)?;
        staged.memberships.insert((organization.id, user.id));

        check(ProvisionStep::ResolveDatasetStatus)?;
        check(ProvisionStep::ResolveDataUseAgreement)?;

        check(ProvisionStep::CreateDataset)?;
        let dataset = Dataset {
            id: staged.allocate_id(),
            node_id: format!("N:dataset:{}", Uuid::new_v4()),
            name: proposal.name.clone(),
        };
        staged.datasets.push(dataset.clone());

        check(ProvisionStep::AddContributor)?;
        let contributor_id = match staged.contributors.iter().find(|c| c.user_id == user.id) {
            Some(existing) => existing.id,
            None => {
                let id = staged.allocate_id();
                staged.contributors.push(ContributorRow {
                    id,
                    user_id: user.id,
                });
                id
            }
        };

        check(ProvisionStep::AttachContributor)?;
        staged
            .dataset_contributors
            .insert((dataset.id, contributor_id));

        check(ProvisionStep::AddOwner)?;
        staged.dataset_owners.insert((dataset.id, user.id));

        Ok(CreatedDataset {
            user,
            organization,
            dataset,
        })
    }
}

#[async_trait]
impl RelationalStore for MemoryDirectory {
    async fn get_proposal_user(&self, user_id: i64) -> Result<User, RelationalError> {
        self.inner
            .read()
            .await
            .users
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or(RelationalError::UserNotFound { user_id })
    }

    async fn get_repository_workspace(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Organization, RelationalError> {
        let inner = self.inner.read().await;
        Self::organization_by(&inner, |o| o.node_id == repository.organization_node_id)
            .cloned()
            .ok_or_else(|| RelationalError::OrganizationNotFound {
                key: repository.organization_node_id.clone(),
            })
    }

    async fn get_publishing_team(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Vec<Publisher>, RelationalError> {
        Ok(self
            .inner
            .read()
            .await
            .publishers
            .iter()
            .filter(|p| p.workspace_node_id == repository.organization_node_id)
            .cloned()
            .collect())
    }

    async fn get_welcome_workspace(&self) -> Result<Organization, RelationalError> {
        let inner = self.inner.read().await;
        Self::organization_by(&inner, |o| o.slug == self.welcome_slug)
            .cloned()
            .ok_or_else(|| RelationalError::OrganizationNotFound {
                key: self.welcome_slug.clone(),
            })
    }

    async fn create_dataset_for_accepted_proposal(
        &self,
        proposal: &DatasetProposalRecord,
    ) -> Result<CreatedDataset, RelationalError> {
        let fail_at = *self.fail_at.read().await;
        let mut inner = self.inner.write().await;
        let mut staged = inner.clone();

        let created = self.provision(&mut staged, proposal, fail_at)?;
        debug!(dataset_id = created.dataset.id, "staged dataset provisioning");

        *inner = staged;
        info!(
            user_id = created.user.id,
            dataset_node_id = %created.dataset.node_id,
            "provisioned dataset for accepted proposal"
        );
        Ok(created)
    }
}
