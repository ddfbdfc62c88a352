use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub node_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl User {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// An organization (workspace) in the relational schema.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Organization {
    pub id: i64,
    pub node_id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Dataset {
    pub id: i64,
    pub node_id: String,
    pub name: String,
}

/// A member of a workspace's publishing team.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::FromRow))]
pub struct Publisher {
    pub workspace_id: i64,
    pub workspace_node_id: String,
    pub workspace_name: String,
    pub team_id: i64,
    pub team_name: String,
    pub user_id: i64,
    pub user_name: String,
    pub email_address: String,
}

/// Everything created or resolved while provisioning a dataset for an
/// accepted proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDataset {
    pub user: User,
    pub organization: Organization,
    pub dataset: Dataset,
}
