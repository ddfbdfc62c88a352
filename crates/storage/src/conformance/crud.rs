use std::future::Future;

use super::{make_proposal, TestResult};
use crate::record::ProposalStatus;
use crate::{ProposalStore, StorageError};

pub(super) async fn run_crud_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    vec![
        TestResult::from_result(
            "crud",
            "create_then_get_returns_same_record",
            create_then_get_returns_same_record(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "create_duplicate_key_is_already_exists",
            create_duplicate_key_is_already_exists(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "same_node_id_different_user_is_distinct",
            same_node_id_different_user_is_distinct(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "update_replaces_all_fields",
            update_replaces_all_fields(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "delete_removes_record",
            delete_removes_record(factory).await,
        ),
        TestResult::from_result(
            "crud",
            "delete_missing_is_ok",
            delete_missing_is_ok(factory).await,
        ),
    ]
}

async fn create_then_get_returns_same_record<S, F, Fut>(factory: &F) -> Result<(), String>
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

    let stored = s
        .get_dataset_proposal(42, "N:proposal:a")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored != record {
        return Err(format!("read back differs: {stored:?} != {record:?}"));
    }
    Ok(())
}

async fn create_duplicate_key_is_already_exists<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_proposal(42, "N:proposal:a", 7, ProposalStatus::Draft);
    s.create_dataset_proposal(&record)
        .await
        .map_err(|e| format!("first create: {e}"))?;

    let mut second = record.clone();
    second.name = "other".to_string();
    match s.create_dataset_proposal(&second).await {
        Err(StorageError::AlreadyExists { user_id, node_id })
            if user_id == 42 && node_id == "N:proposal:a" =>
        {
            let stored = s
                .get_dataset_proposal(42, "N:proposal:a")
                .await
                .map_err(|e| format!("get: {e}"))?;
            if stored.name != record.name {
                return Err("duplicate create overwrote the original".to_string());
            }
            Ok(())
        }
        other => Err(format!("expected AlreadyExists, got {other:?}")),
    }
}

async fn same_node_id_different_user_is_distinct<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    s.create_dataset_proposal(&make_proposal(1, "N:proposal:x", 7, ProposalStatus::Draft))
        .await
        .map_err(|e| format!("create user 1: {e}"))?;
    s.create_dataset_proposal(&make_proposal(2, "N:proposal:x", 7, ProposalStatus::Draft))
        .await
        .map_err(|e| format!("create user 2: {e}"))?;

    let first = s
        .get_dataset_proposal(1, "N:proposal:x")
        .await
        .map_err(|e| format!("get user 1: {e}"))?;
    if first.user_id != 1 {
        return Err(format!("expected user 1, got {}", first.user_id));
    }
    Ok(())
}

async fn update_replaces_all_fields<S, F, Fut>(factory: &F) -> Result<(), String>
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

    let mut updated = record.clone();
    updated.name = "Renamed".to_string();
    updated.survey.clear();
    updated.contributors.clear();
    updated.updated_at += 60;
    s.update_dataset_proposal(&updated)
        .await
        .map_err(|e| format!("update: {e}"))?;

    let stored = s
        .get_dataset_proposal(42, "N:proposal:a")
        .await
        .map_err(|e| format!("get: {e}"))?;
    if stored != updated {
        return Err(format!("update not applied: {stored:?}"));
    }
    Ok(())
}

async fn delete_removes_record<S, F, Fut>(factory: &F) -> Result<(), String>
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
    s.delete_dataset_proposal(&record.key())
        .await
        .map_err(|e| format!("delete: {e}"))?;

    match s.get_dataset_proposal(42, "N:proposal:a").await {
        Err(StorageError::NotFound { .. }) => Ok(()),
        other => Err(format!("expected NotFound after delete, got {other:?}")),
    }
}

async fn delete_missing_is_ok<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory().await;
    let record = make_proposal(42, "N:proposal:none", 7, ProposalStatus::Draft);
    s.delete_dataset_proposal(&record.key())
        .await
        .map_err(|e| format!("delete of missing record failed: {e}"))
}
