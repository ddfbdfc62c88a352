//! Conformance test suite for `ProposalStore` implementations.
//!
//! A backend-agnostic suite that any document store backend runs to verify
//! it honours the proposal contract:
//!
//! - **CRUD**: create, read back, replace, delete, duplicate detection
//! - **Queries**: per-user listing and the two workspace-scoped indexes
//! - **Conditional writes**: expected-status checks and their error variants
//! - **Concurrency**: racing conditional writes, exactly one winner
//! - **Errors**: correct variants and identifying fields for missing records
//!
//! # Usage
//!
//! ```ignore
//! use publishing_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn mongo_conformance() {
//!     let report = run_conformance_suite(|| async { fresh_mongo_store().await }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod conditional;
mod concurrent;
mod crud;
mod error;
mod queries;

use std::fmt;
use std::future::Future;

use crate::record::{Contributor, DatasetProposalRecord, ProposalStatus, SurveyAnswer};
use crate::ProposalStore;

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "crud", "conditional").
    pub category: String,
    pub name: String,
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a proposal store.
///
/// `factory` is called once per test and must return a fresh, empty store.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: ProposalStore,
    F: Fn() -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(crud::run_crud_tests(&factory).await);
    results.extend(error::run_error_tests(&factory).await);
    results.extend(queries::run_query_tests(&factory).await);
    results.extend(conditional::run_conditional_tests(&factory).await);
    results.extend(concurrent::run_concurrent_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn make_proposal(
    user_id: i64,
    node_id: &str,
    repository_id: i64,
    status: ProposalStatus,
) -> DatasetProposalRecord {
    DatasetProposalRecord {
        user_id,
        node_id: node_id.to_string(),
        owner_name: "Test Owner".to_string(),
        email_address: "owner@example.org".to_string(),
        name: format!("Proposal {node_id}"),
        description: "conformance".to_string(),
        repository_id,
        organization_node_id: format!("N:organization:{repository_id}"),
        dataset_node_id: String::new(),
        proposal_status: status,
        survey: vec![SurveyAnswer {
            question_id: 1,
            response: "answer".to_string(),
        }],
        contributors: vec![Contributor {
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email_address: "grace@example.org".to_string(),
        }],
        created_at: 1_700_000_000,
        updated_at: 1_700_000_000,
        ..Default::default()
    }
}

fn node_ids(records: &[DatasetProposalRecord]) -> Vec<String> {
    let mut ids: Vec<String> = records.iter().map(|r| r.node_id.clone()).collect();
    ids.sort();
    ids
}
