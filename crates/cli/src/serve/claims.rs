//! Caller identity forwarded by the upstream authorizer.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::error::ApiError;

pub(crate) const USER_ID: &str = "x-user-id";
pub(crate) const ORGANIZATION_ID: &str = "x-organization-id";
pub(crate) const ORGANIZATION_NODE_ID: &str = "x-organization-node-id";
pub(crate) const PUBLISHER: &str = "x-publisher";

/// Identity claims for one request.
///
/// `X-User-Id` is mandatory. The organization claims describe the
/// workspace the caller is acting in; `X-Publisher: true` marks a member of
/// that workspace's publishing team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Claims {
    pub(crate) user_id: i64,
    pub(crate) organization_id: Option<i64>,
    pub(crate) organization_node_id: Option<String>,
    pub(crate) publisher: bool,
}

impl Claims {
    pub(crate) fn from_headers(headers: &HeaderMap) -> Result<Self, ApiError> {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        };

        let user_id = text(USER_ID)
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or(ApiError::Unauthorized("missing or invalid user claim"))?;

        Ok(Self {
            user_id,
            organization_id: text(ORGANIZATION_ID).and_then(|v| v.parse().ok()),
            organization_node_id: text(ORGANIZATION_NODE_ID).map(str::to_string),
            publisher: text(PUBLISHER).is_some_and(|v| v.eq_ignore_ascii_case("true")),
        })
    }

    /// The caller's workspace, provided the caller publishes for it.
    pub(crate) fn publishing_workspace(&self) -> Result<Workspace<'_>, ApiError> {
        if !self.publisher {
            return Err(ApiError::Unauthorized("publisher role required"));
        }
        match (self.organization_id, self.organization_node_id.as_deref()) {
            (Some(id), Some(node_id)) => Ok(Workspace { id, node_id }),
            _ => Err(ApiError::Unauthorized("missing organization claim")),
        }
    }
}

/// The workspace a publisher is acting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Workspace<'a> {
    /// Also the repository id of the workspace's repository.
    pub(crate) id: i64,
    pub(crate) node_id: &'a str,
}

impl<S: Send + Sync> FromRequestParts<S> for Claims {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Claims::from_headers(&parts.headers)
    }
}
