use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use publishing_notify::{
    EmailNotifier, MemorySender, MessageAttributes, Notifier, NotifyError, StaticTemplateSource,
};
use publishing_relational::{
    DirectorySeed, MemoryDirectory, Organization, ProvisionStep, Publisher, User,
};
use publishing_service::{
    DatasetProposalDto, ManualClock, PublishingService, ServiceConfig, ServiceError,
    SignedUrlSigner, SurveyDto,
};
use publishing_storage::{
    DatasetProposalRecord, FileLocation, InfoRecord, InfoStore, MemoryStore, ProposalKey,
    ProposalStatus, ProposalStore, PublishingStore, QuestionRecord, QuestionStore,
    RepositoryRecord, RepositoryStore, SeedData, StorageError,
};

const REPO_ORG: &str = "N:organization:repo";
const REPO_ID: i64 = 20;
const START: i64 = 1_000;

struct Harness {
    service: PublishingService,
    directory: Arc<MemoryDirectory>,
    sender: MemorySender,
    clock: Arc<ManualClock>,
}

fn seed(required: Vec<i64>) -> SeedData {
    SeedData {
        repositories: vec![RepositoryRecord {
            organization_node_id: REPO_ORG.to_string(),
            repository_id: REPO_ID,
            name: "repo".to_string(),
            display_name: "Repo Workspace".to_string(),
            kind: "PUBLIC".to_string(),
            overview_document: FileLocation {
                bucket: "docs".to_string(),
                key: "repo/overview.pdf".to_string(),
            },
            questions: required,
            ..Default::default()
        }],
        questions: vec![
            QuestionRecord {
                id: 1,
                question: "What is the study about?".to_string(),
                kind: "string".to_string(),
            },
            QuestionRecord {
                id: 2,
                question: "Is there human subject data?".to_string(),
                kind: "string".to_string(),
            },
        ],
        ..Default::default()
    }
}

fn directory() -> MemoryDirectory {
    MemoryDirectory::new(DirectorySeed {
        users: vec![User {
            id: 42,
            node_id: "N:user:42".to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.org".to_string(),
        }],
        organizations: vec![
            Organization {
                id: 10,
                node_id: "N:organization:publishing".to_string(),
                name: "Publishing".to_string(),
                slug: "publishing".to_string(),
            },
            Organization {
                id: 11,
                node_id: "N:organization:welcome".to_string(),
                name: "Welcome".to_string(),
                slug: "welcome".to_string(),
            },
        ],
        publishers: vec![Publisher {
            workspace_id: 20,
            workspace_node_id: REPO_ORG.to_string(),
            workspace_name: "Repo".to_string(),
            team_id: 3,
            team_name: "Publishers".to_string(),
            user_id: 7,
            user_name: "Pat Publisher".to_string(),
            email_address: "pat@example.org".to_string(),
        }],
        publishing_organization_id: 10,
        welcome_workspace_slug: "welcome".to_string(),
    })
}

fn harness_with(seed: SeedData, notifier: Option<Arc<dyn Notifier>>) -> Harness {
    harness_on(Arc::new(MemoryStore::with_seed(seed)), notifier)
}

fn harness_on(store: Arc<dyn PublishingStore>, notifier: Option<Arc<dyn Notifier>>) -> Harness {
    let sender = MemorySender::new();
    let directory = Arc::new(directory());
    let clock = Arc::new(ManualClock::new(START));
    let notifier = notifier.unwrap_or_else(|| -> Arc<dyn Notifier> {
        Arc::new(EmailNotifier::new(
            "publishing@example.org",
            Arc::new(StaticTemplateSource::builtin()),
            Arc::new(sender.clone()),
        ))
    });
    let config = ServiceConfig {
        app_url: "app.example.org".to_string(),
        notification_timeout: Duration::from_millis(200),
        ..Default::default()
    };
    let service = PublishingService::new(
        store,
        directory.clone(),
        notifier,
        Arc::new(SignedUrlSigner::new("https://files.example.org", "secret")),
        config,
    )
    .with_clock(clock.clone());
    Harness {
        service,
        directory,
        sender,
        clock,
    }
}

fn harness() -> Harness {
    harness_with(seed(vec![1, 2]), None)
}

fn answers(ids: &[i64]) -> Vec<SurveyDto> {
    ids.iter()
        .map(|&id| SurveyDto {
            question_id: id,
            response: "yes".to_string(),
        })
        .collect()
}

fn input(survey: &[i64]) -> DatasetProposalDto {
    DatasetProposalDto {
        name: "Study A".to_string(),
        description: "A study".to_string(),
        repository_id: REPO_ID,
        organization_node_id: REPO_ORG.to_string(),
        survey: answers(survey),
        ..Default::default()
    }
}

async fn submitted(h: &Harness) -> DatasetProposalDto {
    let created = h
        .service
        .create_dataset_proposal(42, &input(&[1, 2]))
        .await
        .unwrap();
    h.clock.advance(10);
    h.service
        .submit_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap()
}

// ── Create / update / delete ─────────────────────────────────────────────────

#[tokio::test]
async fn create_makes_owned_draft() {
    let h = harness();
    let created = h
        .service
        .create_dataset_proposal(42, &input(&[1]))
        .await
        .unwrap();

    assert!(created.proposal_node_id.starts_with("N:proposal:"));
    assert_eq!(created.status, ProposalStatus::Draft);
    assert_eq!(created.user_id, 42);
    assert_eq!(created.owner_name, "Ada Lovelace");
    assert_eq!(created.email_address, "ada@example.org");
    assert_eq!(created.created_at, START);
    assert_eq!(created.updated_at, START);
    assert_eq!(created.submitted_at, 0);

    let listed = h.service.get_dataset_proposals_for_user(42).await.unwrap();
    assert_eq!(listed, vec![created]);
}

#[tokio::test]
async fn create_for_unknown_user_is_not_found() {
    let h = harness();
    let err = h
        .service
        .create_dataset_proposal(999, &input(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn create_requires_target_workspace() {
    let h = harness();
    let mut dto = input(&[]);
    dto.organization_node_id.clear();
    let err = h.service.create_dataset_proposal(42, &dto).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }), "{err}");
}

#[tokio::test]
async fn update_replaces_editable_fields_only() {
    let h = harness();
    let created = h
        .service
        .create_dataset_proposal(42, &input(&[1]))
        .await
        .unwrap();
    h.clock.advance(5);

    let mut existing = created.clone();
    existing.owner_name = "Stale Name".to_string();
    existing.email_address = "stale@example.org".to_string();

    let mut update = input(&[1, 2]);
    update.name = "Study B".to_string();
    update.organization_node_id = "N:organization:elsewhere".to_string();
    update.status = ProposalStatus::Accepted;
    update.owner_name = "Mallory".to_string();
    update.email_address = "mallory@example.org".to_string();

    let updated = h
        .service
        .update_dataset_proposal(42, &existing, &update)
        .await
        .unwrap();
    assert_eq!(updated.name, "Study B");
    assert_eq!(updated.owner_name, "Ada Lovelace");
    assert_eq!(updated.email_address, "ada@example.org");
    assert_eq!(updated.survey.len(), 2);
    assert_eq!(updated.organization_node_id, REPO_ORG);
    assert_eq!(updated.status, ProposalStatus::Draft);
    assert_eq!(updated.created_at, START);
    assert_eq!(updated.updated_at, START + 5);

    let stored = h
        .service
        .get_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn update_by_another_user_is_not_found() {
    let h = harness();
    let created = h
        .service
        .create_dataset_proposal(42, &input(&[1]))
        .await
        .unwrap();
    let err = h
        .service
        .update_dataset_proposal(43, &created, &input(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn update_after_submit_is_invalid_state() {
    let h = harness();
    let proposal = submitted(&h).await;
    let err = h
        .service
        .update_dataset_proposal(42, &proposal, &input(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState { .. }), "{err}");
}

#[tokio::test]
async fn update_from_stale_draft_is_conflict() {
    let h = harness();
    let draft = h
        .service
        .create_dataset_proposal(42, &input(&[1, 2]))
        .await
        .unwrap();
    h.service
        .submit_dataset_proposal(42, &draft.proposal_node_id)
        .await
        .unwrap();

    let err = h
        .service
        .update_dataset_proposal(42, &draft, &input(&[1]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { .. }), "{err}");

    let stored = h
        .service
        .get_dataset_proposal(42, &draft.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(stored.status, ProposalStatus::Submitted);
    assert_eq!(stored.survey.len(), 2);
}

#[tokio::test]
async fn delete_removes_proposal() {
    let h = harness();
    let created = h
        .service
        .create_dataset_proposal(42, &input(&[]))
        .await
        .unwrap();
    h.service.delete_dataset_proposal(&created).await.unwrap();

    let err = h
        .service
        .get_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err}");
}

// ── Transitions ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn submit_requires_every_question() {
    let h = harness();
    let created = h
        .service
        .create_dataset_proposal(42, &input(&[1]))
        .await
        .unwrap();

    let err = h
        .service
        .submit_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }), "{err}");
    assert!(err.to_string().contains("all required questions not answered"));

    let stored = h
        .service
        .get_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(stored.status, ProposalStatus::Draft);
    assert!(h.sender.sent().await.is_empty());
}

#[tokio::test]
async fn submit_notifies_publishing_team() {
    let h = harness();
    let proposal = submitted(&h).await;

    assert_eq!(proposal.status, ProposalStatus::Submitted);
    assert_eq!(proposal.submitted_at, START + 10);
    assert_eq!(proposal.updated_at, START + 10);

    let sent = h.sender.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, vec!["pat@example.org".to_string()]);
    assert!(sent[0].body.contains("Repo Workspace"));
    assert!(sent[0].body.contains("Ada Lovelace"));
    assert!(sent[0].body.contains("https://app.example.org/N:organization:repo"));

    let listing = h
        .service
        .get_dataset_proposals_for_workspace(REPO_ORG, ProposalStatus::Submitted)
        .await
        .unwrap();
    assert_eq!(listing.total_count, 1);
    assert_eq!(listing.proposals[0].proposal_node_id, proposal.proposal_node_id);
}

#[tokio::test]
async fn submit_against_unknown_repository_is_not_found() {
    let h = harness();
    let mut dto = input(&[1, 2]);
    dto.organization_node_id = "N:organization:nowhere".to_string();
    let created = h.service.create_dataset_proposal(42, &dto).await.unwrap();

    let err = h
        .service
        .submit_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn accept_provisions_dataset_and_notifies_owner() {
    let h = harness();
    let proposal = submitted(&h).await;
    h.clock.advance(10);

    let accepted = h
        .service
        .accept_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(accepted.status, ProposalStatus::Accepted);
    assert_eq!(accepted.accepted_at, START + 20);
    assert_eq!(accepted.submitted_at, START + 10);

    let datasets = h.directory.datasets().await;
    assert_eq!(datasets.len(), 1);
    assert_eq!(accepted.dataset_node_id, datasets[0].node_id);
    assert!(h.directory.is_owner(datasets[0].id, 42).await);

    let sent = h.sender.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].to, vec!["ada@example.org".to_string()]);
    assert!(sent[1].body.contains("N:organization:welcome"));
}

#[tokio::test]
async fn accept_failure_leaves_proposal_submitted() {
    let h = harness();
    let proposal = submitted(&h).await;
    h.directory
        .fail_at(Some(ProvisionStep::CreateDataset))
        .await;

    let err = h
        .service
        .accept_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::ExternalOperation { .. }), "{err}");

    let stored = h
        .service
        .get_dataset_proposal(42, &proposal.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(stored.status, ProposalStatus::Submitted);
    assert!(stored.dataset_node_id.is_empty());
    assert!(h.directory.datasets().await.is_empty());
}

#[tokio::test]
async fn accept_from_wrong_repository_is_not_found() {
    let h = harness();
    let proposal = submitted(&h).await;
    let err = h
        .service
        .accept_dataset_proposal(REPO_ID + 1, &proposal.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err}");
}

#[tokio::test]
async fn submit_pins_repository_of_target_workspace() {
    let h = harness();
    let mut dto = input(&[1, 2]);
    dto.repository_id = 999;
    let created = h.service.create_dataset_proposal(42, &dto).await.unwrap();

    let proposal = h
        .service
        .submit_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(proposal.repository_id, REPO_ID);

    let err = h
        .service
        .accept_dataset_proposal(999, &proposal.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err}");
    assert!(h.directory.datasets().await.is_empty());

    let accepted = h
        .service
        .accept_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(accepted.status, ProposalStatus::Accepted);
}

#[tokio::test]
async fn accept_twice_is_invalid_state() {
    let h = harness();
    let proposal = submitted(&h).await;
    h.service
        .accept_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap();

    let err = h
        .service
        .accept_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState { .. }), "{err}");
    assert_eq!(h.directory.datasets().await.len(), 1);

    let err = h
        .service
        .reject_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState { .. }), "{err}");
}

#[tokio::test]
async fn reject_twice_is_invalid_state() {
    let h = harness();
    let proposal = submitted(&h).await;
    h.service
        .reject_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap();

    let err = h
        .service
        .reject_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState { .. }), "{err}");

    let stored = h
        .service
        .get_dataset_proposal(42, &proposal.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(stored.status, ProposalStatus::Rejected);
}

#[tokio::test]
async fn publisher_cannot_see_drafts() {
    let h = harness();
    let draft = h
        .service
        .create_dataset_proposal(42, &input(&[1, 2]))
        .await
        .unwrap();
    let err = h
        .service
        .reject_dataset_proposal(REPO_ID, &draft.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }), "{err}");
}

/// Memory store whose proposal is withdrawn by another writer just before
/// an accept is persisted.
struct RacingStore {
    inner: MemoryStore,
}

#[async_trait]
impl InfoStore for RacingStore {
    async fn get_publishing_info(&self) -> Result<Vec<InfoRecord>, StorageError> {
        self.inner.get_publishing_info().await
    }
}

#[async_trait]
impl RepositoryStore for RacingStore {
    async fn get_repositories(&self) -> Result<Vec<RepositoryRecord>, StorageError> {
        self.inner.get_repositories().await
    }

    async fn get_repository(
        &self,
        organization_node_id: &str,
    ) -> Result<RepositoryRecord, StorageError> {
        self.inner.get_repository(organization_node_id).await
    }
}

#[async_trait]
impl QuestionStore for RacingStore {
    async fn get_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        self.inner.get_questions().await
    }
}

#[async_trait]
impl ProposalStore for RacingStore {
    async fn get_dataset_proposal(
        &self,
        user_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, StorageError> {
        self.inner.get_dataset_proposal(user_id, node_id).await
    }

    async fn get_dataset_proposals_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<DatasetProposalRecord>, StorageError> {
        self.inner.get_dataset_proposals_for_user(user_id).await
    }

    async fn get_dataset_proposals_for_workspace(
        &self,
        organization_node_id: &str,
        status: ProposalStatus,
    ) -> Result<Vec<DatasetProposalRecord>, StorageError> {
        self.inner
            .get_dataset_proposals_for_workspace(organization_node_id, status)
            .await
    }

    async fn get_dataset_proposal_for_repository(
        &self,
        repository_id: i64,
        status: ProposalStatus,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, StorageError> {
        self.inner
            .get_dataset_proposal_for_repository(repository_id, status, node_id)
            .await
    }

    async fn create_dataset_proposal(
        &self,
        record: &DatasetProposalRecord,
    ) -> Result<(), StorageError> {
        self.inner.create_dataset_proposal(record).await
    }

    async fn update_dataset_proposal(
        &self,
        record: &DatasetProposalRecord,
    ) -> Result<(), StorageError> {
        self.inner.update_dataset_proposal(record).await
    }

    async fn update_dataset_proposal_if(
        &self,
        record: &DatasetProposalRecord,
        expected: ProposalStatus,
    ) -> Result<(), StorageError> {
        if record.proposal_status == ProposalStatus::Accepted {
            let mut withdrawn = self
                .inner
                .get_dataset_proposal(record.user_id, &record.node_id)
                .await?;
            withdrawn.proposal_status = ProposalStatus::Withdrawn;
            self.inner.update_dataset_proposal(&withdrawn).await?;
        }
        self.inner.update_dataset_proposal_if(record, expected).await
    }

    async fn delete_dataset_proposal(&self, key: &ProposalKey) -> Result<(), StorageError> {
        self.inner.delete_dataset_proposal(key).await
    }
}

#[tokio::test]
async fn accept_losing_race_is_conflict() {
    let store = Arc::new(RacingStore {
        inner: MemoryStore::with_seed(seed(vec![1, 2])),
    });
    let h = harness_on(store, None);
    let proposal = submitted(&h).await;

    let err = h
        .service
        .accept_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Conflict { .. }), "{err}");

    let stored = h
        .service
        .get_dataset_proposal(42, &proposal.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(stored.status, ProposalStatus::Withdrawn);
    assert!(stored.dataset_node_id.is_empty());
    assert_eq!(h.directory.datasets().await.len(), 1);
    assert_eq!(h.sender.sent().await.len(), 1);
}

#[tokio::test]
async fn reject_notifies_owner() {
    let h = harness();
    let proposal = submitted(&h).await;
    let rejected = h
        .service
        .reject_dataset_proposal(REPO_ID, &proposal.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(rejected.status, ProposalStatus::Rejected);
    assert!(rejected.rejected_at > 0);
    assert!(h.directory.datasets().await.is_empty());

    let sent = h.sender.sent().await;
    assert_eq!(sent.last().unwrap().to, vec!["ada@example.org".to_string()]);
}

#[tokio::test]
async fn withdraw_from_draft_is_invalid_state() {
    let h = harness();
    let created = h
        .service
        .create_dataset_proposal(42, &input(&[1, 2]))
        .await
        .unwrap();
    let err = h
        .service
        .withdraw_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState { .. }), "{err}");
}

#[tokio::test]
async fn second_transition_keeps_first_timestamp() {
    let h = harness();
    let proposal = submitted(&h).await;
    h.clock.advance(10);
    let withdrawn = h
        .service
        .withdraw_dataset_proposal(42, &proposal.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(withdrawn.withdrawn_at, START + 20);

    h.clock.advance(10);
    let err = h
        .service
        .withdraw_dataset_proposal(42, &proposal.proposal_node_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InvalidState { .. }), "{err}");

    let stored = h
        .service
        .get_dataset_proposal(42, &proposal.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(stored.withdrawn_at, START + 20);
    assert_eq!(stored.updated_at, START + 20);
}

#[tokio::test]
async fn updated_at_never_goes_backwards() {
    let h = harness();
    let created = h
        .service
        .create_dataset_proposal(42, &input(&[1, 2]))
        .await
        .unwrap();
    h.clock.set(START - 500);
    let proposal = h
        .service
        .submit_dataset_proposal(42, &created.proposal_node_id)
        .await
        .unwrap();
    assert_eq!(proposal.updated_at, START);
}

// ── Notification failures ────────────────────────────────────────────────────

#[tokio::test]
async fn notification_failure_does_not_fail_transition() {
    let h = harness();
    h.sender.set_failing(true).await;
    let proposal = submitted(&h).await;
    assert_eq!(proposal.status, ProposalStatus::Submitted);
    assert!(h.sender.sent().await.is_empty());
}

struct StalledNotifier;

impl StalledNotifier {
    async fn stall(&self) -> Result<(), NotifyError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(())
    }
}

#[async_trait]
impl Notifier for StalledNotifier {
    async fn proposal_submitted(
        &self,
        _: &MessageAttributes,
        _: &[String],
    ) -> Result<(), NotifyError> {
        self.stall().await
    }

    async fn proposal_withdrawn(
        &self,
        _: &MessageAttributes,
        _: &[String],
    ) -> Result<(), NotifyError> {
        self.stall().await
    }

    async fn proposal_accepted(
        &self,
        _: &MessageAttributes,
        _: &[String],
    ) -> Result<(), NotifyError> {
        self.stall().await
    }

    async fn proposal_rejected(
        &self,
        _: &MessageAttributes,
        _: &[String],
    ) -> Result<(), NotifyError> {
        self.stall().await
    }
}

#[tokio::test]
async fn stalled_notification_is_bounded() {
    let h = harness_with(seed(vec![1, 2]), Some(Arc::new(StalledNotifier)));
    let started = std::time::Instant::now();
    let proposal = submitted(&h).await;
    assert_eq!(proposal.status, ProposalStatus::Submitted);
    assert!(started.elapsed() < Duration::from_secs(5));
}

// ── Projections ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn repositories_skip_unknown_questions() {
    let h = harness_with(seed(vec![1, 99, 2]), None);
    let repos = h.service.get_publishing_repositories().await.unwrap();
    assert_eq!(repos.len(), 1);

    let ids: Vec<i64> = repos[0].questions.iter().map(|q| q.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(repos[0]
        .overview_document
        .starts_with("https://files.example.org/docs/repo/overview.pdf?expires="));
    assert_eq!(repos[0].logo_file, "");
}

#[tokio::test]
async fn questions_are_listed() {
    let h = harness();
    let questions = h.service.get_proposal_questions().await.unwrap();
    assert_eq!(questions.len(), 2);
}
