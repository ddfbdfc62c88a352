use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A file held in object storage, addressed by bucket and key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileLocation {
    #[serde(rename = "s3bucket")]
    pub bucket: String,
    #[serde(rename = "s3Key")]
    pub key: String,
}

/// A general publishing information document (guides, terms, FAQs).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InfoRecord {
    pub tag: String,
    #[serde(rename = "Type")]
    pub kind: String,
    pub file: FileLocation,
}

/// A publishing repository: the workspace a proposal is submitted to.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RepositoryRecord {
    pub organization_node_id: String,
    /// Internal numeric id of the backing organization.
    pub repository_id: i64,
    pub name: String,
    pub display_name: String,
    #[serde(rename = "Type")]
    pub kind: String,
    pub description: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub overview_document: FileLocation,
    pub logo_file: FileLocation,
    /// Ids of the questions a proposal must answer before submission, in display order.
    #[serde(default)]
    pub questions: Vec<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A survey question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct QuestionRecord {
    pub id: i64,
    pub question: String,
    #[serde(rename = "Type")]
    pub kind: String,
}

/// An answer to one survey question, embedded in a proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SurveyAnswer {
    pub question_id: i64,
    pub response: String,
}

/// A dataset contributor, embedded in a proposal.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Contributor {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

/// Lifecycle status of a dataset proposal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProposalStatus {
    #[default]
    Draft,
    Submitted,
    Withdrawn,
    Accepted,
    Rejected,
}

impl ProposalStatus {
    pub const ALL: [ProposalStatus; 5] = [
        ProposalStatus::Draft,
        ProposalStatus::Submitted,
        ProposalStatus::Withdrawn,
        ProposalStatus::Accepted,
        ProposalStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProposalStatus::Draft => "DRAFT",
            ProposalStatus::Submitted => "SUBMITTED",
            ProposalStatus::Withdrawn => "WITHDRAWN",
            ProposalStatus::Accepted => "ACCEPTED",
            ProposalStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown status string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown proposal status '{0}'")]
pub struct UnknownStatus(pub String);

impl FromStr for ProposalStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ProposalStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

/// A dataset proposal as persisted in the document store.
///
/// `(user_id, node_id)` is the primary key. `(repository_id, proposal_status)`
/// and `(organization_node_id, proposal_status)` are the workspace-scoped
/// secondary indexes. The transition timestamps are zero until the
/// corresponding transition is taken.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetProposalRecord {
    pub user_id: i64,
    pub node_id: String,
    pub owner_name: String,
    pub email_address: String,
    pub name: String,
    pub description: String,
    pub repository_id: i64,
    pub organization_node_id: String,
    #[serde(default)]
    pub dataset_node_id: String,
    pub proposal_status: ProposalStatus,
    #[serde(default)]
    pub survey: Vec<SurveyAnswer>,
    #[serde(default)]
    pub contributors: Vec<Contributor>,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub submitted_at: i64,
    #[serde(default)]
    pub withdrawn_at: i64,
    #[serde(default)]
    pub accepted_at: i64,
    #[serde(default)]
    pub rejected_at: i64,
}

impl DatasetProposalRecord {
    pub fn key(&self) -> ProposalKey {
        ProposalKey {
            user_id: self.user_id,
            node_id: self.node_id.clone(),
        }
    }
}

/// Primary key of a dataset proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProposalKey {
    pub user_id: i64,
    pub node_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!("submitted".parse(), Ok(ProposalStatus::Submitted));
        assert_eq!("DRAFT".parse(), Ok(ProposalStatus::Draft));
        assert_eq!(
            "PUBLISHED".parse::<ProposalStatus>(),
            Err(UnknownStatus("PUBLISHED".to_string()))
        );
    }

    #[test]
    fn proposal_uses_document_attribute_names() {
        let record = DatasetProposalRecord {
            user_id: 42,
            node_id: "N:proposal:1".to_string(),
            proposal_status: ProposalStatus::Submitted,
            survey: vec![SurveyAnswer {
                question_id: 1,
                response: "yes".to_string(),
            }],
            ..Default::default()
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["UserId"], 42);
        assert_eq!(json["NodeId"], "N:proposal:1");
        assert_eq!(json["ProposalStatus"], "SUBMITTED");
        assert_eq!(json["Survey"][0]["QuestionId"], 1);
    }

    #[test]
    fn repository_reads_legacy_file_location_keys() {
        let json = serde_json::json!({
            "OrganizationNodeId": "N:organization:1",
            "RepositoryId": 7,
            "Name": "sparc",
            "DisplayName": "SPARC",
            "Type": "PUBLIC",
            "Description": "",
            "URL": "https://example.org",
            "OverviewDocument": {"s3bucket": "docs", "s3Key": "overview.pdf"},
            "LogoFile": {"s3bucket": "docs", "s3Key": "logo.png"},
            "Questions": [1, 2],
            "CreatedAt": 1,
            "UpdatedAt": 2
        });
        let repo: RepositoryRecord = serde_json::from_value(json).unwrap();
        assert_eq!(repo.overview_document.key, "overview.pdf");
        assert_eq!(repo.questions, vec![1, 2]);
    }
}
