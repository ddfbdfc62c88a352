//! PostgreSQL relational store.
//!
//! Global tables live in the `pennsieve` schema; per-organization tables
//! (datasets, contributors, dataset status, data use agreements) live in a
//! schema named after the organization id. Provisioning sets
//! `search_path` for the duration of its transaction only.

use async_trait::async_trait;
use publishing_storage::{DatasetProposalRecord, RepositoryRecord};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{ProvisionStep, RelationalError};
use crate::record::{CreatedDataset, Dataset, Organization, Publisher, User};
use crate::traits::RelationalStore;

/// Permission bit granted to proposal owners in the publishing organization.
const GUEST_PERMISSION: i32 = 1;
const OWNER_ROLE: &str = "owner";

#[derive(Debug, Clone)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    /// Organization that receives datasets for accepted proposals.
    pub publishing_organization_id: i64,
    /// Slug of the workspace linked from acceptance emails.
    pub welcome_workspace_slug: String,
}

#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
    organization_id: i64,
    welcome_slug: String,
}

fn backend(context: &str, e: sqlx::Error) -> RelationalError {
    RelationalError::Backend(format!("{context}: {e}"))
}

fn failed(step: ProvisionStep) -> impl Fn(sqlx::Error) -> RelationalError {
    move |e| RelationalError::step(step, e.to_string())
}

impl PostgresStore {
    pub async fn connect(config: &PostgresConfig) -> Result<Self, RelationalError> {
        info!(
            organization_id = config.publishing_organization_id,
            "connecting to relational store"
        );
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.url)
            .await
            .map_err(|e| backend("connect", e))?;
        Ok(Self::from_pool(
            pool,
            config.publishing_organization_id,
            &config.welcome_workspace_slug,
        ))
    }

    pub fn from_pool(pool: PgPool, organization_id: i64, welcome_slug: &str) -> Self {
        Self {
            pool,
            organization_id,
            welcome_slug: welcome_slug.to_string(),
        }
    }

    async fn fetch_user(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id::bigint AS id, node_id, first_name, last_name, email
            FROM pennsieve.users
            WHERE id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
    }

    async fn find_contributor(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT id::bigint FROM contributors WHERE user_id = $1 LIMIT 1",
        )
        .bind(user_id)
        .fetch_optional(&mut **tx)
        .await
    }

    /// The provisioning steps. Any `Err` leaves `tx` uncommitted.
    async fn provision(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        proposal: &DatasetProposalRecord,
    ) -> Result<CreatedDataset, RelationalError> {
        sqlx::query(&format!(
            "SET LOCAL search_path = \"{}\", pennsieve",
            self.organization_id
        ))
        .execute(&mut **tx)
        .await
        .map_err(|e| backend("set search path", e))?;

        let user = Self::fetch_user(tx, proposal.user_id)
            .await
            .map_err(failed(ProvisionStep::ResolveUser))?
            .ok_or_else(|| {
                RelationalError::step(
                    ProvisionStep::ResolveUser,
                    format!("user {} does not exist", proposal.user_id),
                )
            })?;
        debug!(user_id = user.id, "resolved proposal owner");

        let organization = sqlx::query_as::<_, Organization>(
            r#"
            SELECT id::bigint AS id, node_id, name, slug
            FROM pennsieve.organizations
            WHERE id = $1
            "#,
        )
        .bind(self.organization_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(failed(ProvisionStep::ResolveOrganization))?
        .ok_or_else(|| {
            RelationalError::step(
                ProvisionStep::ResolveOrganization,
                format!("organization {} does not exist", self.organization_id),
            )
        })?;

        sqlx::query(
            r#"
            INSERT INTO pennsieve.organization_user (organization_id, user_id, permission_bit)
            VALUES ($1, $2, $3)
            ON CONFLICT (organization_id, user_id) DO NOTHING
            "#,
        )
        .bind(organization.id)
        .bind(user.id)
        .bind(GUEST_PERMISSION)
        .execute(&mut **tx)
        .await
        .map_err(failed(ProvisionStep::AddGuestMembership))?;

        let status_id = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM dataset_status ORDER BY id LIMIT 1",
        )
        .fetch_optional(&mut **tx)
        .await
        .map_err(failed(ProvisionStep::ResolveDatasetStatus))?
        .ok_or_else(|| {
            RelationalError::step(
                ProvisionStep::ResolveDatasetStatus,
                "organization has no dataset status",
            )
        })?;

        let agreement_id = sqlx::query_scalar::<_, i32>(
            "SELECT id FROM data_use_agreements WHERE is_default = true LIMIT 1",
        )
        .fetch_optional(&mut **tx)
        .await
        .map_err(failed(ProvisionStep::ResolveDataUseAgreement))?
        .ok_or_else(|| {
            RelationalError::step(
                ProvisionStep::ResolveDataUseAgreement,
                "organization has no default data use agreement",
            )
        })?;

        let dataset = sqlx::query_as::<_, Dataset>(
            r#"
            INSERT INTO datasets
                (name, node_id, state, description, status_id,
                 automatically_process_packages, license, tags, data_use_agreement_id)
            VALUES ($1, $2, 'READY', '', $3, false, '', '{}', $4)
            RETURNING id::bigint AS id, node_id, name
            "#,
        )
        .bind(&proposal.name)
        .bind(format!("N:dataset:{}", Uuid::new_v4()))
        .bind(status_id)
        .bind(agreement_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(failed(ProvisionStep::CreateDataset))?;
        debug!(dataset_id = dataset.id, node_id = %dataset.node_id, "created dataset");

        let contributor_id = match Self::find_contributor(tx, user.id)
            .await
            .map_err(failed(ProvisionStep::AddContributor))?
        {
            Some(id) => id,
            None => sqlx::query_scalar::<_, i64>(
                r#"
                INSERT INTO contributors (first_name, last_name, email, user_id)
                VALUES ($1, $2, $3, $4)
                RETURNING id::bigint
                "#,
            )
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(user.id)
            .fetch_one(&mut **tx)
            .await
            .map_err(failed(ProvisionStep::AddContributor))?,
        };

        sqlx::query(
            r#"
            INSERT INTO dataset_contributor (dataset_id, contributor_id, contributor_order)
            VALUES ($1, $2, 1)
            "#,
        )
        .bind(dataset.id)
        .bind(contributor_id)
        .execute(&mut **tx)
        .await
        .map_err(failed(ProvisionStep::AttachContributor))?;

        sqlx::query("INSERT INTO dataset_user (dataset_id, user_id, role) VALUES ($1, $2, $3)")
            .bind(dataset.id)
            .bind(user.id)
            .bind(OWNER_ROLE)
            .execute(&mut **tx)
            .await
            .map_err(failed(ProvisionStep::AddOwner))?;

        Ok(CreatedDataset {
            user,
            organization,
            dataset,
        })
    }
}

#[async_trait]
impl RelationalStore for PostgresStore {
    async fn get_proposal_user(&self, user_id: i64) -> Result<User, RelationalError> {
        sqlx::query_as::<_, User>(
            "SELECT id::bigint AS id, node_id, first_name, last_name, email FROM pennsieve.users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("get user", e))?
        .ok_or(RelationalError::UserNotFound { user_id })
    }

    async fn get_repository_workspace(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Organization, RelationalError> {
        sqlx::query_as::<_, Organization>(
            "SELECT id::bigint AS id, node_id, name, slug FROM pennsieve.organizations WHERE node_id = $1",
        )
        .bind(&repository.organization_node_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("get repository workspace", e))?
        .ok_or_else(|| RelationalError::OrganizationNotFound {
            key: repository.organization_node_id.clone(),
        })
    }

    async fn get_publishing_team(
        &self,
        repository: &RepositoryRecord,
    ) -> Result<Vec<Publisher>, RelationalError> {
        sqlx::query_as::<_, Publisher>(
            r#"
            SELECT
                o.id::bigint AS workspace_id,
                o.node_id AS workspace_node_id,
                o.name AS workspace_name,
                ot.team_id::bigint AS team_id,
                t.name AS team_name,
                tu.user_id::bigint AS user_id,
                u.first_name || ' ' || u.last_name AS user_name,
                u.email AS email_address
            FROM pennsieve.organizations o
            JOIN pennsieve.organization_team ot ON o.id = ot.organization_id
            JOIN pennsieve.teams t ON ot.team_id = t.id
            JOIN pennsieve.team_user tu ON t.id = tu.team_id
            JOIN pennsieve.users u ON tu.user_id = u.id
            JOIN pennsieve.organization_user ou
                ON u.id = ou.user_id AND o.id = ou.organization_id
            WHERE o.node_id = $1
              AND ot.system_team_type = 'publishers'
            "#,
        )
        .bind(&repository.organization_node_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| backend("get publishing team", e))
    }

    async fn get_welcome_workspace(&self) -> Result<Organization, RelationalError> {
        sqlx::query_as::<_, Organization>(
            "SELECT id::bigint AS id, node_id, name, slug FROM pennsieve.organizations WHERE slug = $1",
        )
        .bind(&self.welcome_slug)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| backend("get welcome workspace", e))?
        .ok_or_else(|| RelationalError::OrganizationNotFound {
            key: self.welcome_slug.clone(),
        })
    }

    async fn create_dataset_for_accepted_proposal(
        &self,
        proposal: &DatasetProposalRecord,
    ) -> Result<CreatedDataset, RelationalError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| backend("begin transaction", e))?;

        // Dropping `tx` on an error path rolls the transaction back.
        let created = match self.provision(&mut tx, proposal).await {
            Ok(created) => created,
            Err(e) => {
                error!(
                    user_id = proposal.user_id,
                    node_id = %proposal.node_id,
                    error = %e,
                    "dataset provisioning rolled back"
                );
                return Err(e);
            }
        };

        tx.commit()
            .await
            .map_err(|e| RelationalError::step(ProvisionStep::AddOwner, format!("commit: {e}")))?;
        info!(
            user_id = created.user.id,
            dataset_node_id = %created.dataset.node_id,
            "provisioned dataset for accepted proposal"
        );
        Ok(created)
    }
}
