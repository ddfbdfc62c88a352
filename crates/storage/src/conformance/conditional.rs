use std::future::Future;

use super::{make_proposal, TestResult};
use crate::record::ProposalStatus;
use crate::{ProposalStore, StorageError};

pub(super) async fn run_conditional_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "conditional",
            "matching_status_writes",
            matching_status_writes(factory).await,
        ),
        TestResult::from_result(
            "conditional",
            "stale_status_conflicts_and_keeps_record",
            stale_status_conflicts_and_keeps_record(factory).await,
        ),
        TestResult::from_result(
            "conditional",
            "conflict_carries_expected_status",
            conflict_carries_expected_status(factory).await,
        ),
        TestResult::from_result(
            "conditional",
            "missing_record_not_found",
            missing_record_not_found(factory).await,
        ),
        TestResult::from_result(
            "conditional",
            "second_identical_transition_conflicts",
            second_identical_transition_conflicts(factory).await,
        ),
    ]
}

async fn matching_status_writes<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_proposal(42, "N:proposal:a", 7, ProposalStatus::Draft);
    s.create_dataset_proposal(&record)
        .await
        .map_err(|e| format!("create: {e}"))?;

    let mut submitted = record.clone();
    submitted.proposal_status = ProposalStatus::Submitted;
    submitted.submitted_at = 1_700_000_100;
    s.update_dataset_proposal_if(&submitted, ProposalStatus::Draft)
        .await
        .map_err(|e| format!("conditional update: {e}"))?;

    let stored = s
        .get_dataset_proposal(42, "N:proposal:a")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored != submitted {
        return Err(format!("write not applied: {stored:?}"));
    }
    Ok(())
}

async fn stale_status_conflicts_and_keeps_record<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_proposal(42, "N:proposal:a", 7, ProposalStatus::Withdrawn);
    s.create_dataset_proposal(&record)
        .await
        .map_err(|e| format!("create: {e}"))?;

    let mut accepted = record.clone();
    accepted.proposal_status = ProposalStatus::Accepted;
    match s
        .update_dataset_proposal_if(&accepted, ProposalStatus::Submitted)
        .await
    {
        Err(StorageError::Conflict { .. }) => {}
        other => return Err(format!("expected Conflict, got {other:?}")),
    }

    let stored = s
        .get_dataset_proposal(42, "N:proposal:a")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored.proposal_status != ProposalStatus::Withdrawn {
        return Err(format!(
            "rejected write changed status to {}",
            stored.proposal_status
        ));
    }
    Ok(())
}

async fn conflict_carries_expected_status<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_proposal(42, "N:proposal:a", 7, ProposalStatus::Rejected);
    s.create_dataset_proposal(&record)
        .await
        .map_err(|e| format!("create: {e}"))?;

    match s
        .update_dataset_proposal_if(&record, ProposalStatus::Submitted)
        .await
    {
        Err(StorageError::Conflict {
            user_id,
            node_id,
            expected,
        }) => {
            if user_id != 42 || node_id != "N:proposal:a" {
                return Err(format!("conflict names wrong key: {user_id}/{node_id}"));
            }
            if expected != ProposalStatus::Submitted {
                return Err(format!("expected status SUBMITTED, got {expected}"));
            }
            Ok(())
        }
        other => Err(format!("expected Conflict, got {other:?}")),
    }
}

async fn missing_record_not_found<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_proposal(42, "N:proposal:gone", 7, ProposalStatus::Submitted);
    match s
        .update_dataset_proposal_if(&record, ProposalStatus::Draft)
        .await
    {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound, got {other:?}")),
    }
}

async fn second_identical_transition_conflicts<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_proposal(42, "N:proposal:a", 7, ProposalStatus::Submitted);
    s.create_dataset_proposal(&record)
        .await
        .map_err(|e| format!("create: {e}"))?;

    let mut withdrawn = record.clone();
    withdrawn.proposal_status = ProposalStatus::Withdrawn;
    withdrawn.withdrawn_at = 100;
    s.update_dataset_proposal_if(&withdrawn, ProposalStatus::Submitted)
        .await
        .map_err(|e| format!("first withdraw: {e}"))?;

    let mut again = withdrawn.clone();
    again.withdrawn_at = 200;
    match s
        .update_dataset_proposal_if(&again, ProposalStatus::Submitted)
        .await
    {
        Err(StorageError::Conflict { .. }) => {}
        other => return Err(format!("expected Conflict, got {other:?}")),
    }

    let stored = s
        .get_dataset_proposal(42, "N:proposal:a")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored.withdrawn_at != 100 {
        return Err(format!("timestamp rewritten to {}", stored.withdrawn_at));
    }
    Ok(())
}
