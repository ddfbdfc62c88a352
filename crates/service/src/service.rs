use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use publishing_notify::{normalize_recipients, MessageAttributes, Notifier, ProposalEvent};
use publishing_relational::RelationalStore;
use publishing_storage::{
    DatasetProposalRecord, ProposalStatus, PublishingStore, RepositoryRecord, StorageError,
};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::clock::{stamp, Clock, SystemClock};
use crate::dto::{
    DatasetProposalDto, DatasetSubmissionsDto, InfoDto, QuestionDto, RepositoryDto,
};
use crate::error::{During, NotificationFailure, ServiceError};
use crate::lifecycle::{missing_questions, Transition};
use crate::presign::UrlSigner;

/// Settings the service needs at runtime. Resolved once at startup.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Host of the web application, e.g. `app.pennsieve.io`.
    pub app_url: String,
    pub overview_url_expiry: Duration,
    pub logo_url_expiry: Duration,
    /// Upper bound on one notification step (lookups, template, send).
    pub notification_timeout: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            app_url: "app.localhost".to_string(),
            overview_url_expiry: Duration::from_secs(12 * 60 * 60),
            logo_url_expiry: Duration::from_secs(60 * 60),
            notification_timeout: Duration::from_secs(10),
        }
    }
}

/// Dataset proposal CRUD and lifecycle.
///
/// Owns every proposal mutation. Reads and writes proposals through the
/// document store, provisions datasets through the relational store on
/// Accept, and emails the publishing team or the proposal owner after each
/// transition. Notification failures are logged, never returned.
pub struct PublishingService {
    store: Arc<dyn PublishingStore>,
    directory: Arc<dyn RelationalStore>,
    notifier: Arc<dyn Notifier>,
    signer: Arc<dyn UrlSigner>,
    clock: Arc<dyn Clock>,
    config: ServiceConfig,
}

impl PublishingService {
    pub fn new(
        store: Arc<dyn PublishingStore>,
        directory: Arc<dyn RelationalStore>,
        notifier: Arc<dyn Notifier>,
        signer: Arc<dyn UrlSigner>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            store,
            directory,
            notifier,
            signer,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    // ── Read-only projections ────────────────────────────────────────────────

    pub async fn get_publishing_info(&self) -> Result<Vec<InfoDto>, ServiceError> {
        const OP: &str = "get publishing info";
        let info = self.store.get_publishing_info().await.during(OP)?;
        let now = self.clock.now();
        Ok(info
            .iter()
            .map(|i| InfoDto {
                tag: i.tag.clone(),
                kind: i.kind.clone(),
                url: self.signer.presign(
                    &i.file.bucket,
                    &i.file.key,
                    self.config.overview_url_expiry,
                    now,
                ),
            })
            .collect())
    }

    /// All repositories with their questions resolved and file URLs signed.
    ///
    /// A question id a repository lists but the question collection lacks
    /// is skipped with a warning.
    pub async fn get_publishing_repositories(&self) -> Result<Vec<RepositoryDto>, ServiceError> {
        const OP: &str = "get publishing repositories";
        let repositories = self.store.get_repositories().await.during(OP)?;
        let questions: BTreeMap<i64, QuestionDto> = self
            .store
            .get_questions()
            .await
            .during(OP)?
            .iter()
            .map(|q| (q.id, QuestionDto::from(q)))
            .collect();
        let now = self.clock.now();

        Ok(repositories
            .iter()
            .map(|repo| self.repository_dto(repo, &questions, now))
            .collect())
    }

    fn repository_dto(
        &self,
        repo: &RepositoryRecord,
        questions: &BTreeMap<i64, QuestionDto>,
        now: i64,
    ) -> RepositoryDto {
        let resolved = repo
            .questions
            .iter()
            .filter_map(|id| {
                let question = questions.get(id).cloned();
                if question.is_none() {
                    warn!(
                        repository = %repo.organization_node_id,
                        question_id = id,
                        "repository references unknown question, skipping"
                    );
                }
                question
            })
            .collect();

        RepositoryDto {
            organization_node_id: repo.organization_node_id.clone(),
            name: repo.name.clone(),
            display_name: repo.display_name.clone(),
            repository_id: repo.repository_id,
            kind: repo.kind.clone(),
            description: repo.description.clone(),
            url: repo.url.clone(),
            overview_document: self.signer.presign(
                &repo.overview_document.bucket,
                &repo.overview_document.key,
                self.config.overview_url_expiry,
                now,
            ),
            logo_file: self.signer.presign(
                &repo.logo_file.bucket,
                &repo.logo_file.key,
                self.config.logo_url_expiry,
                now,
            ),
            questions: resolved,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
        }
    }

    pub async fn get_proposal_questions(&self) -> Result<Vec<QuestionDto>, ServiceError> {
        let questions = self
            .store
            .get_questions()
            .await
            .during("get proposal questions")?;
        Ok(questions.iter().map(QuestionDto::from).collect())
    }

    pub async fn get_dataset_proposal(
        &self,
        user_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalDto, ServiceError> {
        let record = self
            .store
            .get_dataset_proposal(user_id, node_id)
            .await
            .during("get dataset proposal")?;
        Ok(DatasetProposalDto::from(&record))
    }

    pub async fn get_dataset_proposals_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<DatasetProposalDto>, ServiceError> {
        let records = self
            .store
            .get_dataset_proposals_for_user(user_id)
            .await
            .during("get dataset proposals for user")?;
        Ok(records.iter().map(DatasetProposalDto::from).collect())
    }

    pub async fn get_dataset_proposals_for_workspace(
        &self,
        organization_node_id: &str,
        status: ProposalStatus,
    ) -> Result<DatasetSubmissionsDto, ServiceError> {
        let records = self
            .store
            .get_dataset_proposals_for_workspace(organization_node_id, status)
            .await
            .during("get dataset proposals for workspace")?;
        Ok(DatasetSubmissionsDto::new(
            records.iter().map(DatasetProposalDto::from).collect(),
        ))
    }

    // ── Proposal CRUD ────────────────────────────────────────────────────────

    /// Create a DRAFT proposal owned by `user_id` with a fresh `N:proposal:<uuid>` id.
    pub async fn create_dataset_proposal(
        &self,
        user_id: i64,
        input: &DatasetProposalDto,
    ) -> Result<DatasetProposalDto, ServiceError> {
        const OP: &str = "create dataset proposal";
        if input.organization_node_id.trim().is_empty() {
            return Err(ServiceError::Validation {
                operation: OP,
                message: "OrganizationNodeId is required".to_string(),
            });
        }
        let user = self.directory.get_proposal_user(user_id).await.during(OP)?;
        let now = self.clock.now();

        let record = DatasetProposalRecord {
            user_id,
            node_id: format!("N:proposal:{}", Uuid::new_v4()),
            owner_name: user.display_name(),
            email_address: user.email.clone(),
            name: input.name.clone(),
            description: input.description.clone(),
            repository_id: input.repository_id,
            organization_node_id: input.organization_node_id.clone(),
            dataset_node_id: String::new(),
            proposal_status: ProposalStatus::Draft,
            survey: input.survey_answers(),
            contributors: input.contributor_records(),
            created_at: now,
            updated_at: now,
            ..Default::default()
        };
        self.store.create_dataset_proposal(&record).await.during(OP)?;

        info!(user_id, node_id = %record.node_id, "created dataset proposal");
        Ok(DatasetProposalDto::from(&record))
    }

    /// Replace the mutable fields of a DRAFT proposal owned by `user_id`.
    ///
    /// Identity, target workspace, status and timestamps come from
    /// `existing`; owner name and email are refreshed from the user record.
    pub async fn update_dataset_proposal(
        &self,
        user_id: i64,
        existing: &DatasetProposalDto,
        update: &DatasetProposalDto,
    ) -> Result<DatasetProposalDto, ServiceError> {
        const OP: &str = "update dataset proposal";
        if existing.user_id != user_id {
            return Err(ServiceError::NotFound {
                operation: OP,
                what: format!("dataset proposal {user_id}/{}", existing.proposal_node_id),
            });
        }
        if existing.status != ProposalStatus::Draft {
            return Err(ServiceError::wrong_status(
                OP,
                &existing.proposal_node_id,
                existing.status,
                ProposalStatus::Draft,
            ));
        }
        let user = self.directory.get_proposal_user(user_id).await.during(OP)?;

        let record = DatasetProposalRecord {
            user_id,
            node_id: existing.proposal_node_id.clone(),
            owner_name: user.display_name(),
            email_address: user.email.clone(),
            name: update.name.clone(),
            description: update.description.clone(),
            repository_id: existing.repository_id,
            organization_node_id: existing.organization_node_id.clone(),
            dataset_node_id: existing.dataset_node_id.clone(),
            proposal_status: existing.status,
            survey: update.survey_answers(),
            contributors: update.contributor_records(),
            created_at: existing.created_at,
            updated_at: stamp(self.clock.as_ref(), existing.updated_at),
            submitted_at: existing.submitted_at,
            withdrawn_at: existing.withdrawn_at,
            accepted_at: existing.accepted_at,
            rejected_at: existing.rejected_at,
        };
        self.store
            .update_dataset_proposal_if(&record, ProposalStatus::Draft)
            .await
            .during(OP)?;

        info!(user_id, node_id = %record.node_id, "updated dataset proposal");
        Ok(DatasetProposalDto::from(&record))
    }

    pub async fn delete_dataset_proposal(
        &self,
        proposal: &DatasetProposalDto,
    ) -> Result<(), ServiceError> {
        self.store
            .delete_dataset_proposal(&proposal.key())
            .await
            .during("delete dataset proposal")?;
        info!(
            user_id = proposal.user_id,
            node_id = %proposal.proposal_node_id,
            "deleted dataset proposal"
        );
        Ok(())
    }

    // ── Lifecycle transitions ────────────────────────────────────────────────

    /// DRAFT → SUBMITTED, once every question the repository requires has an answer.
    pub async fn submit_dataset_proposal(
        &self,
        user_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalDto, ServiceError> {
        let transition = Transition::Submit;
        let op = transition.operation();
        let proposal = self
            .store
            .get_dataset_proposal(user_id, node_id)
            .await
            .during(op)?;
        check_status(transition, &proposal)?;

        let repository = self
            .store
            .get_repository(&proposal.organization_node_id)
            .await
            .during(op)?;
        if repository.organization_node_id != proposal.organization_node_id {
            return Err(ServiceError::InvalidState {
                operation: op,
                node_id: node_id.to_string(),
                reason: format!(
                    "targets {} but its repository is {}",
                    proposal.organization_node_id, repository.organization_node_id
                ),
            });
        }

        let missing = missing_questions(&repository.questions, &proposal.survey);
        if !missing.is_empty() {
            return Err(ServiceError::Validation {
                operation: op,
                message: format!("all required questions not answered (missing {missing:?})"),
            });
        }

        let mut pinned = proposal.clone();
        if pinned.repository_id != repository.repository_id {
            warn!(
                node_id,
                requested = pinned.repository_id,
                repository_id = repository.repository_id,
                "proposal carried a foreign repository id, using the workspace's"
            );
            pinned.repository_id = repository.repository_id;
        }
        let submitted = self.persist_transition(transition, &pinned).await?;
        info!(user_id, node_id, "submitted dataset proposal");

        self.notify_publishing_team(ProposalEvent::Submitted, &submitted)
            .await;
        Ok(DatasetProposalDto::from(&submitted))
    }

    /// SUBMITTED → WITHDRAWN, by the owner.
    pub async fn withdraw_dataset_proposal(
        &self,
        user_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalDto, ServiceError> {
        let transition = Transition::Withdraw;
        let proposal = self
            .store
            .get_dataset_proposal(user_id, node_id)
            .await
            .during(transition.operation())?;
        check_status(transition, &proposal)?;

        let withdrawn = self.persist_transition(transition, &proposal).await?;
        info!(user_id, node_id, "withdrew dataset proposal");

        self.notify_publishing_team(ProposalEvent::Withdrawn, &withdrawn)
            .await;
        Ok(DatasetProposalDto::from(&withdrawn))
    }

    /// SUBMITTED → ACCEPTED, by the repository's publishing team.
    ///
    /// Provisions the dataset first. If provisioning fails the proposal is
    /// left untouched. Provisioning is not idempotent: retrying after the
    /// proposal write failed creates a second dataset.
    pub async fn accept_dataset_proposal(
        &self,
        repository_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalDto, ServiceError> {
        let transition = Transition::Accept;
        let op = transition.operation();
        let proposal = self
            .find_for_repository(transition, repository_id, node_id)
            .await?;

        let created = self
            .directory
            .create_dataset_for_accepted_proposal(&proposal)
            .await
            .map_err(|source| ServiceError::ExternalOperation {
                operation: op,
                source,
            })?;
        debug!(?created, "dataset provisioned for proposal");

        let mut accepted = proposal.clone();
        accepted.dataset_node_id = created.dataset.node_id.clone();
        accepted.organization_node_id = created.organization.node_id.clone();
        transition.apply(&mut accepted, stamp(self.clock.as_ref(), proposal.updated_at));

        if let Err(e) = self
            .store
            .update_dataset_proposal_if(&accepted, transition.from())
            .await
        {
            error!(
                repository_id,
                node_id,
                dataset_node_id = %created.dataset.node_id,
                error = %e,
                "dataset provisioned but proposal not marked accepted; dataset is orphaned"
            );
            return Err::<DatasetProposalDto, _>(e).during(op);
        }
        info!(
            repository_id,
            node_id,
            dataset_node_id = %accepted.dataset_node_id,
            "accepted dataset proposal"
        );

        self.notify_proposal_owner(
            ProposalEvent::Accepted,
            &accepted,
            &proposal.organization_node_id,
        )
        .await;
        Ok(DatasetProposalDto::from(&accepted))
    }

    /// SUBMITTED → REJECTED, by the repository's publishing team.
    pub async fn reject_dataset_proposal(
        &self,
        repository_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalDto, ServiceError> {
        let transition = Transition::Reject;
        let proposal = self
            .find_for_repository(transition, repository_id, node_id)
            .await?;

        let rejected = self.persist_transition(transition, &proposal).await?;
        info!(repository_id, node_id, "rejected dataset proposal");

        self.notify_proposal_owner(
            ProposalEvent::Rejected,
            &rejected,
            &rejected.organization_node_id,
        )
        .await;
        Ok(DatasetProposalDto::from(&rejected))
    }

    /// The SUBMITTED proposal `node_id` in `repository_id`, for a publisher
    /// transition.
    ///
    /// A proposal the repository already settled (withdrawn, accepted or
    /// rejected) fails `InvalidState`. Drafts are never visible to the
    /// publishing team and stay `NotFound`.
    async fn find_for_repository(
        &self,
        transition: Transition,
        repository_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, ServiceError> {
        let op = transition.operation();
        let missing = match self
            .store
            .get_dataset_proposal_for_repository(repository_id, transition.from(), node_id)
            .await
        {
            Err(e @ StorageError::NotFound { .. }) => e,
            found => return found.during(op),
        };

        for settled in [
            ProposalStatus::Withdrawn,
            ProposalStatus::Accepted,
            ProposalStatus::Rejected,
        ] {
            match self
                .store
                .get_dataset_proposal_for_repository(repository_id, settled, node_id)
                .await
            {
                Ok(proposal) => {
                    check_status(transition, &proposal)?;
                    return Ok(proposal);
                }
                Err(StorageError::NotFound { .. }) => continue,
                Err(e) => return Err::<DatasetProposalRecord, _>(e).during(op),
            }
        }
        Err::<DatasetProposalRecord, _>(missing).during(op)
    }

    /// Apply `transition` and write it only if the stored status is still
    /// the one it starts from.
    async fn persist_transition(
        &self,
        transition: Transition,
        proposal: &DatasetProposalRecord,
    ) -> Result<DatasetProposalRecord, ServiceError> {
        let mut next = proposal.clone();
        transition.apply(&mut next, stamp(self.clock.as_ref(), proposal.updated_at));
        self.store
            .update_dataset_proposal_if(&next, transition.from())
            .await
            .during(transition.operation())?;
        Ok(next)
    }

    // ── Notifications ────────────────────────────────────────────────────────

    fn message_attributes(
        &self,
        proposal: &DatasetProposalRecord,
        repository: &RepositoryRecord,
    ) -> MessageAttributes {
        [
            ("AppURL", self.config.app_url.as_str()),
            ("AuthorName", proposal.owner_name.as_str()),
            ("AuthorEmail", proposal.email_address.as_str()),
            ("ProposalTitle", proposal.name.as_str()),
            ("WorkspaceName", repository.display_name.as_str()),
            ("WorkspaceNodeId", repository.organization_node_id.as_str()),
        ]
        .into_iter()
        .collect()
    }

    async fn dispatch(
        &self,
        event: ProposalEvent,
        attributes: &MessageAttributes,
        recipients: &[String],
    ) -> Result<(), NotificationFailure> {
        match event {
            ProposalEvent::Submitted => {
                self.notifier
                    .proposal_submitted(attributes, recipients)
                    .await?
            }
            ProposalEvent::Withdrawn => {
                self.notifier
                    .proposal_withdrawn(attributes, recipients)
                    .await?
            }
            ProposalEvent::Accepted => {
                self.notifier
                    .proposal_accepted(attributes, recipients)
                    .await?
            }
            ProposalEvent::Rejected => {
                self.notifier
                    .proposal_rejected(attributes, recipients)
                    .await?
            }
        }
        Ok(())
    }

    async fn send_to_publishing_team(
        &self,
        event: ProposalEvent,
        proposal: &DatasetProposalRecord,
    ) -> Result<(), NotificationFailure> {
        const OP: &str = "notify publishing team";
        let repository = self
            .store
            .get_repository(&proposal.organization_node_id)
            .await
            .during(OP)?;
        let team = self
            .directory
            .get_publishing_team(&repository)
            .await
            .during(OP)?;
        debug!(publishers = team.len(), "resolved publishing team");

        let recipients = normalize_recipients(team.iter().map(|p| p.email_address.as_str()));
        if recipients.is_empty() {
            warn!(
                %event,
                workspace = %repository.organization_node_id,
                "publishing team has no email addresses, skipping notification"
            );
            return Ok(());
        }
        let attributes = self.message_attributes(proposal, &repository);
        self.dispatch(event, &attributes, &recipients).await
    }

    async fn send_to_proposal_owner(
        &self,
        event: ProposalEvent,
        proposal: &DatasetProposalRecord,
        organization_node_id: &str,
    ) -> Result<(), NotificationFailure> {
        const OP: &str = "notify proposal owner";
        let repository = self
            .store
            .get_repository(organization_node_id)
            .await
            .during(OP)?;
        let welcome = self.directory.get_welcome_workspace().await.during(OP)?;

        let recipients = normalize_recipients([proposal.email_address.as_str()]);
        if recipients.is_empty() {
            warn!(%event, node_id = %proposal.node_id, "proposal owner has no email address, skipping notification");
            return Ok(());
        }
        let mut attributes = self.message_attributes(proposal, &repository);
        attributes.insert("WelcomeWorkspaceNodeId", welcome.node_id);
        self.dispatch(event, &attributes, &recipients).await
    }

    async fn notify_publishing_team(&self, event: ProposalEvent, proposal: &DatasetProposalRecord) {
        let outcome = self
            .bounded(self.send_to_publishing_team(event, proposal))
            .await;
        log_notification(event, proposal, outcome);
    }

    async fn notify_proposal_owner(
        &self,
        event: ProposalEvent,
        proposal: &DatasetProposalRecord,
        organization_node_id: &str,
    ) {
        let outcome = self
            .bounded(self.send_to_proposal_owner(event, proposal, organization_node_id))
            .await;
        log_notification(event, proposal, outcome);
    }

    async fn bounded<F>(&self, step: F) -> Result<(), NotificationFailure>
    where
        F: std::future::Future<Output = Result<(), NotificationFailure>>,
    {
        let limit = self.config.notification_timeout;
        match tokio::time::timeout(limit, step).await {
            Ok(result) => result,
            Err(_) => Err(NotificationFailure::Timeout(limit)),
        }
    }
}

fn check_status(
    transition: Transition,
    proposal: &DatasetProposalRecord,
) -> Result<(), ServiceError> {
    if proposal.proposal_status != transition.from() {
        return Err(ServiceError::wrong_status(
            transition.operation(),
            &proposal.node_id,
            proposal.proposal_status,
            transition.from(),
        ));
    }
    Ok(())
}

fn log_notification(
    event: ProposalEvent,
    proposal: &DatasetProposalRecord,
    outcome: Result<(), NotificationFailure>,
) {
    match outcome {
        Ok(()) => debug!(%event, node_id = %proposal.node_id, "notification step finished"),
        Err(e) => error!(
            %event,
            user_id = proposal.user_id,
            node_id = %proposal.node_id,
            error = %e,
            "notification failed; transition already persisted"
        ),
    }
}
