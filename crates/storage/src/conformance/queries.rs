use std::future::Future;

use super::{make_proposal, node_ids, TestResult};
use crate::record::ProposalStatus;
use crate::{ProposalStore, StorageError};

pub(super) async fn run_query_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "queries",
            "user_listing_returns_only_that_user",
            user_listing_returns_only_that_user(factory).await,
        ),
        TestResult::from_result(
            "queries",
            "workspace_listing_filters_by_status",
            workspace_listing_filters_by_status(factory).await,
        ),
        TestResult::from_result(
            "queries",
            "workspace_listing_empty_for_unknown_workspace",
            workspace_listing_empty_for_unknown_workspace(factory).await,
        ),
        TestResult::from_result(
            "queries",
            "repository_lookup_requires_matching_status",
            repository_lookup_requires_matching_status(factory).await,
        ),
        TestResult::from_result(
            "queries",
            "repository_lookup_ambiguous_across_users",
            repository_lookup_ambiguous_across_users(factory).await,
        ),
    ]
}

async fn seed<S: ProposalStore>(s: &S) -> Result<(), String> {
    let records = [
        make_proposal(1, "N:proposal:1a", 7, ProposalStatus::Draft),
        make_proposal(1, "N:proposal:1b", 7, ProposalStatus::Submitted),
        make_proposal(2, "N:proposal:2a", 7, ProposalStatus::Submitted),
        make_proposal(2, "N:proposal:2b", 8, ProposalStatus::Submitted),
        make_proposal(3, "N:proposal:3a", 7, ProposalStatus::Accepted),
    ];
    for record in &records {
        s.create_dataset_proposal(record)
            .await
            .map_err(|e| format!("seed {}: {e}", record.node_id))?;
    }
    Ok(())
}

async fn user_listing_returns_only_that_user<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s).await?;
    let found = s
        .get_dataset_proposals_for_user(1)
        .await
        .map_err(|e| format!("list: {e}"))?;
    let ids = node_ids(&found);
    if ids != ["N:proposal:1a", "N:proposal:1b"] {
        return Err(format!("unexpected user listing: {ids:?}"));
    }
    Ok(())
}

async fn workspace_listing_filters_by_status<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s).await?;
    let found = s
        .get_dataset_proposals_for_workspace("N:organization:7", ProposalStatus::Submitted)
        .await
        .map_err(|e| format!("list: {e}"))?;
    let ids = node_ids(&found);
    if ids != ["N:proposal:1b", "N:proposal:2a"] {
        return Err(format!("unexpected workspace listing: {ids:?}"));
    }

    let accepted = s
        .get_dataset_proposals_for_workspace("N:organization:7", ProposalStatus::Accepted)
        .await
        .map_err(|e| format!("list accepted: {e}"))?;
    if node_ids(&accepted) != ["N:proposal:3a"] {
        return Err(format!("unexpected accepted listing: {accepted:?}"));
    }
    Ok(())
}

async fn workspace_listing_empty_for_unknown_workspace<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s).await?;
    let found = s
        .get_dataset_proposals_for_workspace("N:organization:404", ProposalStatus::Submitted)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if !found.is_empty() {
        return Err(format!("expected empty listing, got {}", found.len()));
    }
    Ok(())
}

async fn repository_lookup_requires_matching_status<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    seed(&s).await?;

    let found = s
        .get_dataset_proposal_for_repository(7, ProposalStatus::Submitted, "N:proposal:1b")
        .await
        .map_err(|e| format!("lookup: {e}"))?;
    if found.user_id != 1 {
        return Err(format!("wrong record returned: {found:?}"));
    }

    match s
        .get_dataset_proposal_for_repository(7, ProposalStatus::Submitted, "N:proposal:1a")
        .await
    {
        Err(StorageError::NotFound { .. }) => {}
        other => return Err(format!("draft matched a submitted lookup: {other:?}")),
    }
    match s
        .get_dataset_proposal_for_repository(8, ProposalStatus::Submitted, "N:proposal:1b")
        .await
    {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("wrong repository matched: {other:?}")),
    }
}

async fn repository_lookup_ambiguous_across_users<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.create_dataset_proposal(&make_proposal(1, "N:proposal:dup", 7, ProposalStatus::Submitted))
        .await
        .map_err(|e| format!("create 1: {e}"))?;
    s.create_dataset_proposal(&make_proposal(2, "N:proposal:dup", 7, ProposalStatus::Submitted))
        .await
        .map_err(|e| format!("create 2: {e}"))?;

    match s
        .get_dataset_proposal_for_repository(7, ProposalStatus::Submitted, "N:proposal:dup")
        .await
    {
        Err(StorageError::Ambiguous { count: 2, .. }) => Ok(()),
        other => Err(format!("expected Ambiguous with count 2, got {other:?}")),
    }
}
