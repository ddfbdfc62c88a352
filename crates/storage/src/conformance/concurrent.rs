use std::future::Future;
use std::sync::Arc;

use super::{make_proposal, TestResult};
use crate::record::ProposalStatus;
use crate::{ProposalStore, StorageError};

/// Number of concurrent tasks to spawn in each test.
const N: usize = 10;

pub(super) async fn run_concurrent_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "concurrent",
            "racing_transitions_exactly_one_wins",
            racing_transitions_exactly_one_wins(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "racing_creates_exactly_one_wins",
            racing_creates_exactly_one_wins(factory).await,
        ),
        TestResult::from_result(
            "concurrent",
            "transitions_on_different_proposals_all_succeed",
            transitions_on_different_proposals_all_succeed(factory).await,
        ),
    ]
}

/// N tasks race to move the same SUBMITTED proposal to ACCEPTED or REJECTED.
/// Exactly one conditional write lands; the rest get Conflict.
async fn racing_transitions_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    let record = make_proposal(42, "N:proposal:race", 7, ProposalStatus::Submitted);
    storage
        .create_dataset_proposal(&record)
        .await
        .map_err(|e| format!("create: {e}"))?;

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        let mut next = record.clone();
        if i % 2 == 0 {
            next.proposal_status = ProposalStatus::Accepted;
            next.accepted_at = 1_700_000_000 + i as i64;
        } else {
            next.proposal_status = ProposalStatus::Rejected;
            next.rejected_at = 1_700_000_000 + i as i64;
        }
        handles.push(tokio::spawn(async move {
            s.update_dataset_proposal_if(&next, ProposalStatus::Submitted)
                .await
                .map(|()| next)
        }));
    }

    let mut winners = Vec::new();
    let mut conflicts = 0;
    for h in handles {
        match h.await.map_err(|e| format!("task panicked: {e}"))? {
            Ok(written) => winners.push(written),
            Err(StorageError::Conflict { .. }) => conflicts += 1,
            Err(e) => return Err(format!("unexpected error: {e}")),
        }
    }

    if winners.len() != 1 || conflicts != N - 1 {
        return Err(format!(
            "expected 1 winner and {} conflicts, got {} winners and {conflicts} conflicts",
            N - 1,
            winners.len()
        ));
    }

    let stored = storage
        .get_dataset_proposal(42, "N:proposal:race")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored != winners[0] {
        return Err("stored record is not the winning write".to_string());
    }
    Ok(())
}

async fn racing_creates_exactly_one_wins<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        let mut record = make_proposal(42, "N:proposal:same", 7, ProposalStatus::Draft);
        record.name = format!("attempt {i}");
        handles.push(tokio::spawn(
            async move { s.create_dataset_proposal(&record).await },
        ));
    }

    let mut created = 0;
    let mut duplicates = 0;
    for h in handles {
        match h.await.map_err(|e| format!("task panicked: {e}"))? {
            Ok(()) => created += 1,
            Err(StorageError::AlreadyExists { .. }) => duplicates += 1,
            Err(e) => return Err(format!("unexpected error: {e}")),
        }
    }
    if created != 1 || duplicates != N - 1 {
        return Err(format!(
            "expected 1 create and {} duplicates, got {created} and {duplicates}",
            N - 1
        ));
    }
    Ok(())
}

async fn transitions_on_different_proposals_all_succeed<S, F, Fut>(
    factory: &F,
) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let storage = Arc::new(factory().await);
    for i in 0..N {
        let record = make_proposal(42, &format!("N:proposal:{i}"), 7, ProposalStatus::Draft);
        storage
            .create_dataset_proposal(&record)
            .await
            .map_err(|e| format!("create {i}: {e}"))?;
    }

    let mut handles = Vec::new();
    for i in 0..N {
        let s = storage.clone();
        let mut next = make_proposal(42, &format!("N:proposal:{i}"), 7, ProposalStatus::Submitted);
        next.submitted_at = 1_700_000_500;
        handles.push(tokio::spawn(async move {
            s.update_dataset_proposal_if(&next, ProposalStatus::Draft).await
        }));
    }
    for (i, h) in handles.into_iter().enumerate() {
        h.await
            .map_err(|e| format!("task panicked: {e}"))?
            .map_err(|e| format!("submit {i}: {e}"))?;
    }

    let listed = storage
        .get_dataset_proposals_for_workspace("N:organization:7", ProposalStatus::Submitted)
        .await
        .map_err(|e| format!("list: {e}"))?;
    if listed.len() != N {
        return Err(format!("expected {N} submitted, got {}", listed.len()));
    }
    Ok(())
}
