//! HTTP route handlers. Each one extracts claims and parameters, calls the
//! service under the request deadline, and serializes the result.

use std::str::FromStr;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use publishing_service::DatasetProposalDto;
use publishing_storage::ProposalStatus;
use serde::Deserialize;
use tracing::debug;

use super::claims::Claims;
use super::error::{json_error, ApiError};
use super::state::AppState;

type Shared = State<Arc<AppState>>;

#[derive(Debug, Deserialize)]
pub(crate) struct NodeIdQuery {
    node_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DeleteQuery {
    proposal_node_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusQuery {
    status: Option<String>,
}

fn required(value: Option<String>, name: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing required parameter: {name}")))
}

fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|e| ApiError::BadRequest(format!("invalid request body: {}", e.body_text())))
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    json_error(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    let response = serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(response))
}

// ── Catalog ──────────────────────────────────────────────────────────────────

/// GET /publishing/info
pub(crate) async fn handle_publishing_info(
    State(state): Shared,
    _claims: Claims,
) -> Result<impl IntoResponse, ApiError> {
    let info = state
        .within("get publishing info", state.service.get_publishing_info())
        .await?;
    Ok(Json(info))
}

/// GET /publishing/repositories
pub(crate) async fn handle_repositories(
    State(state): Shared,
    _claims: Claims,
) -> Result<impl IntoResponse, ApiError> {
    let repositories = state
        .within(
            "get publishing repositories",
            state.service.get_publishing_repositories(),
        )
        .await?;
    Ok(Json(repositories))
}

/// GET /publishing/questions
pub(crate) async fn handle_questions(
    State(state): Shared,
    _claims: Claims,
) -> Result<impl IntoResponse, ApiError> {
    let questions = state
        .within("get proposal questions", state.service.get_proposal_questions())
        .await?;
    Ok(Json(questions))
}

// ── Proposals (author) ───────────────────────────────────────────────────────

/// GET /publishing/proposal
pub(crate) async fn handle_list_proposals(
    State(state): Shared,
    claims: Claims,
) -> Result<impl IntoResponse, ApiError> {
    let proposals = state
        .within(
            "get dataset proposals for user",
            state.service.get_dataset_proposals_for_user(claims.user_id),
        )
        .await?;
    Ok(Json(proposals))
}

/// POST /publishing/proposal
pub(crate) async fn handle_create_proposal(
    State(state): Shared,
    claims: Claims,
    payload: Result<Json<DatasetProposalDto>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input = body(payload)?;
    debug!(user_id = claims.user_id, ?input, "create proposal request");
    let created = state
        .within(
            "create dataset proposal",
            state.service.create_dataset_proposal(claims.user_id, &input),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PUT /publishing/proposal
///
/// The body must carry `ProposalNodeId`; the proposal is looked up under the
/// caller's user id.
pub(crate) async fn handle_update_proposal(
    State(state): Shared,
    claims: Claims,
    payload: Result<Json<DatasetProposalDto>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let update = body(payload)?;
    if update.proposal_node_id.trim().is_empty() {
        return Err(ApiError::BadRequest(
            "missing required field: ProposalNodeId".to_string(),
        ));
    }
    let node_id = update.proposal_node_id.as_str();

    let existing = state
        .within(
            "get dataset proposal",
            state.service.get_dataset_proposal(claims.user_id, node_id),
        )
        .await?;
    let updated = state
        .within(
            "update dataset proposal",
            state
                .service
                .update_dataset_proposal(claims.user_id, &existing, &update),
        )
        .await?;
    Ok(Json(updated))
}

/// DELETE /publishing/proposal?proposal_node_id=
pub(crate) async fn handle_delete_proposal(
    State(state): Shared,
    claims: Claims,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let node_id = required(query.proposal_node_id, "proposal_node_id")?;
    let proposal = state
        .within(
            "get dataset proposal",
            state.service.get_dataset_proposal(claims.user_id, &node_id),
        )
        .await?;
    state
        .within(
            "delete dataset proposal",
            state.service.delete_dataset_proposal(&proposal),
        )
        .await?;
    Ok(Json(proposal))
}

/// POST /publishing/proposal/submit?node_id=
pub(crate) async fn handle_submit_proposal(
    State(state): Shared,
    claims: Claims,
    Query(query): Query<NodeIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let node_id = required(query.node_id, "node_id")?;
    let submitted = state
        .within(
            "submit dataset proposal",
            state
                .service
                .submit_dataset_proposal(claims.user_id, &node_id),
        )
        .await?;
    Ok(Json(submitted))
}

/// POST /publishing/proposal/withdraw?node_id=
pub(crate) async fn handle_withdraw_proposal(
    State(state): Shared,
    claims: Claims,
    Query(query): Query<NodeIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let node_id = required(query.node_id, "node_id")?;
    let withdrawn = state
        .within(
            "withdraw dataset proposal",
            state
                .service
                .withdraw_dataset_proposal(claims.user_id, &node_id),
        )
        .await?;
    Ok(Json(withdrawn))
}

// ── Submissions (publishing team) ────────────────────────────────────────────

/// GET /publishing/submission?status=
///
/// Lists the caller's workspace proposals in `status` (default SUBMITTED).
pub(crate) async fn handle_list_submissions(
    State(state): Shared,
    claims: Claims,
    Query(query): Query<StatusQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = claims.publishing_workspace()?;
    let status = match query.status.as_deref() {
        None | Some("") => ProposalStatus::Submitted,
        Some(raw) => {
            ProposalStatus::from_str(raw).map_err(|e| ApiError::BadRequest(e.to_string()))?
        }
    };
    let listing = state
        .within(
            "get dataset proposals for workspace",
            state
                .service
                .get_dataset_proposals_for_workspace(workspace.node_id, status),
        )
        .await?;
    Ok(Json(listing))
}

/// POST /publishing/submission/accept?node_id=
pub(crate) async fn handle_accept_proposal(
    State(state): Shared,
    claims: Claims,
    Query(query): Query<NodeIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = claims.publishing_workspace()?;
    let node_id = required(query.node_id, "node_id")?;
    let accepted = state
        .within(
            "accept dataset proposal",
            state
                .service
                .accept_dataset_proposal(workspace.id, &node_id),
        )
        .await?;
    Ok(Json(accepted))
}

/// POST /publishing/submission/reject?node_id=
pub(crate) async fn handle_reject_proposal(
    State(state): Shared,
    claims: Claims,
    Query(query): Query<NodeIdQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let workspace = claims.publishing_workspace()?;
    let node_id = required(query.node_id, "node_id")?;
    let rejected = state
        .within(
            "reject dataset proposal",
            state
                .service
                .reject_dataset_proposal(workspace.id, &node_id),
        )
        .await?;
    Ok(Json(rejected))
}
