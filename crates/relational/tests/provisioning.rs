use publishing_relational::{
    DirectorySeed, MemoryDirectory, Organization, ProvisionStep, Publisher, RelationalError,
    RelationalStore, User,
};
use publishing_storage::{DatasetProposalRecord, ProposalStatus, RepositoryRecord};

const PUBLISHING_ORG: i64 = 10;

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
                id: PUBLISHING_ORG,
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
            workspace_node_id: "N:organization:repo".to_string(),
            workspace_name: "Repo".to_string(),
            team_id: 3,
            team_name: "Publishers".to_string(),
            user_id: 7,
            user_name: "Pat Publisher".to_string(),
            email_address: "pat@example.org".to_string(),
        }],
        publishing_organization_id: PUBLISHING_ORG,
        welcome_workspace_slug: "welcome".to_string(),
    })
}

fn proposal(user_id: i64) -> DatasetProposalRecord {
    DatasetProposalRecord {
        user_id,
        node_id: "N:proposal:1".to_string(),
        name: "Study A".to_string(),
        repository_id: 20,
        organization_node_id: "N:organization:repo".to_string(),
        proposal_status: ProposalStatus::Submitted,
        ..Default::default()
    }
}

#[tokio::test]
async fn provisioning_creates_every_record() {
    let dir = directory();
    let created = dir
        .create_dataset_for_accepted_proposal(&proposal(42))
        .await
        .unwrap();

    assert_eq!(created.user.id, 42);
    assert_eq!(created.organization.id, PUBLISHING_ORG);
    assert_eq!(created.dataset.name, "Study A");
    assert!(created.dataset.node_id.starts_with("N:dataset:"));

    assert!(dir.is_member(PUBLISHING_ORG, 42).await);
    assert!(dir.is_owner(created.dataset.id, 42).await);
    assert_eq!(dir.datasets().await.len(), 1);
    assert_eq!(dir.contributors().await.len(), 1);
}

#[tokio::test]
async fn contributor_is_reused_across_datasets() {
    let dir = directory();
    dir.create_dataset_for_accepted_proposal(&proposal(42))
        .await
        .unwrap();
    dir.create_dataset_for_accepted_proposal(&proposal(42))
        .await
        .unwrap();

    assert_eq!(dir.datasets().await.len(), 2);
    assert_eq!(dir.contributors().await.len(), 1);
}

#[tokio::test]
async fn failure_at_any_step_rolls_back_everything() {
    for step in ProvisionStep::ORDER {
        let dir = directory();
        dir.fail_at(Some(step)).await;

        let err = dir
            .create_dataset_for_accepted_proposal(&proposal(42))
            .await
            .unwrap_err();
        assert_eq!(err.failed_step(), Some(step), "{err}");

        assert!(dir.datasets().await.is_empty(), "dataset kept after {step}");
        assert!(dir.contributors().await.is_empty());
        assert!(!dir.is_member(PUBLISHING_ORG, 42).await);
    }
}

#[tokio::test]
async fn unknown_user_fails_at_resolve_user() {
    let dir = directory();
    let err = dir
        .create_dataset_for_accepted_proposal(&proposal(999))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        RelationalError::StepFailed {
            step: ProvisionStep::ResolveUser,
            ..
        }
    ));
}

#[tokio::test]
async fn lookups_resolve_team_and_welcome_workspace() {
    let dir = directory();
    let repository = RepositoryRecord {
        organization_node_id: "N:organization:repo".to_string(),
        ..Default::default()
    };

    let team = dir.get_publishing_team(&repository).await.unwrap();
    assert_eq!(team.len(), 1);
    assert_eq!(team[0].email_address, "pat@example.org");

    let welcome = dir.get_welcome_workspace().await.unwrap();
    assert_eq!(welcome.node_id, "N:organization:welcome");

    assert!(matches!(
        dir.get_repository_workspace(&repository).await,
        Err(RelationalError::OrganizationNotFound { .. })
    ));
    assert!(matches!(
        dir.get_proposal_user(1).await,
        Err(RelationalError::UserNotFound { user_id: 1 })
    ));
}
