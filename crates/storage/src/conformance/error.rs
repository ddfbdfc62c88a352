use std::future::Future;

use super::{make_proposal, TestResult};
use crate::record::ProposalStatus;
use crate::{ProposalStore, StorageError};

pub(super) async fn run_error_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "error",
            "get_missing_proposal_not_found",
            get_missing_proposal_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "not_found_names_the_key",
            not_found_names_the_key(factory).await,
        ),
        TestResult::from_result(
            "error",
            "update_missing_proposal_not_found",
            update_missing_proposal_not_found(factory).await,
        ),
        TestResult::from_result(
            "error",
            "repository_lookup_missing_not_found",
            repository_lookup_missing_not_found(factory).await,
        ),
    ]
}

async fn get_missing_proposal_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_dataset_proposal(42, "N:proposal:missing").await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}

async fn not_found_names_the_key<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s.get_dataset_proposal(42, "N:proposal:missing").await {
        Err(StorageError::NotFound { key, .. }) => {
            if !key.contains("42") || !key.contains("N:proposal:missing") {
                return Err(format!("key does not identify the record: {key}"));
            }
            Ok(())
        }
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}

async fn update_missing_proposal_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_proposal(42, "N:proposal:missing", 7, ProposalStatus::Draft);
    match s.update_dataset_proposal(&record).await {
        Err(StorageError::NotFound { .. }) => {}
        other => return Err(format!("expected NotFound, got {other:?}")),
    }
    // An update must never upsert.
    match s.get_dataset_proposal(42, "N:proposal:missing").await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("update created a record: {other:?}")),
    }
}

async fn repository_lookup_missing_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    match s
        .get_dataset_proposal_for_repository(7, ProposalStatus::Submitted, "N:proposal:missing")
        .await
    {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}
