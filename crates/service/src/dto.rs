//! Wire shapes returned to and accepted from HTTP clients.
//!
//! Repository, question and info DTOs use camelCase keys; proposal DTOs use
//! PascalCase keys.

use publishing_storage::{
    Contributor, DatasetProposalRecord, ProposalKey, ProposalStatus, QuestionRecord, SurveyAnswer,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfoDto {
    pub tag: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Presigned URL for the information document.
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDto {
    pub id: i64,
    pub question: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl From<&QuestionRecord> for QuestionDto {
    fn from(q: &QuestionRecord) -> Self {
        Self {
            id: q.id,
            question: q.question.clone(),
            kind: q.kind.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryDto {
    pub organization_node_id: String,
    pub name: String,
    pub display_name: String,
    pub repository_id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub url: String,
    /// Presigned URL for the overview document.
    pub overview_document: String,
    /// Presigned URL for the logo.
    pub logo_file: String,
    pub questions: Vec<QuestionDto>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SurveyDto {
    pub question_id: i64,
    #[serde(default)]
    pub response: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContributorDto {
    pub first_name: String,
    pub last_name: String,
    pub email_address: String,
}

/// A dataset proposal as seen by clients.
///
/// On input every field is optional. `NodeId` and `ProposalStatus` are
/// accepted as aliases for `ProposalNodeId` and `Status`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct DatasetProposalDto {
    pub user_id: i64,
    #[serde(alias = "NodeId")]
    pub proposal_node_id: String,
    pub owner_name: String,
    pub email_address: String,
    pub name: String,
    pub description: String,
    pub repository_id: i64,
    pub organization_node_id: String,
    pub dataset_node_id: String,
    #[serde(alias = "ProposalStatus")]
    pub status: ProposalStatus,
    pub survey: Vec<SurveyDto>,
    pub contributors: Vec<ContributorDto>,
    pub created_at: i64,
    pub updated_at: i64,
    pub submitted_at: i64,
    pub withdrawn_at: i64,
    pub accepted_at: i64,
    pub rejected_at: i64,
}

impl DatasetProposalDto {
    pub fn key(&self) -> ProposalKey {
        ProposalKey {
            user_id: self.user_id,
            node_id: self.proposal_node_id.clone(),
        }
    }

    pub(crate) fn survey_answers(&self) -> Vec<SurveyAnswer> {
        self.survey
            .iter()
            .map(|s| SurveyAnswer {
                question_id: s.question_id,
                response: s.response.clone(),
            })
            .collect()
    }

    pub(crate) fn contributor_records(&self) -> Vec<Contributor> {
        self.contributors
            .iter()
            .map(|c| Contributor {
                first_name: c.first_name.clone(),
                last_name: c.last_name.clone(),
                email_address: c.email_address.clone(),
            })
            .collect()
    }
}

impl From<&DatasetProposalRecord> for DatasetProposalDto {
    fn from(p: &DatasetProposalRecord) -> Self {
        Self {
            user_id: p.user_id,
            proposal_node_id: p.node_id.clone(),
            owner_name: p.owner_name.clone(),
            email_address: p.email_address.clone(),
            name: p.name.clone(),
            description: p.description.clone(),
            repository_id: p.repository_id,
            organization_node_id: p.organization_node_id.clone(),
            dataset_node_id: p.dataset_node_id.clone(),
            status: p.proposal_status,
            survey: p
                .survey
                .iter()
                .map(|s| SurveyDto {
                    question_id: s.question_id,
                    response: s.response.clone(),
                })
                .collect(),
            contributors: p
                .contributors
                .iter()
                .map(|c| ContributorDto {
                    first_name: c.first_name.clone(),
                    last_name: c.last_name.clone(),
                    email_address: c.email_address.clone(),
                })
                .collect(),
            created_at: p.created_at,
            updated_at: p.updated_at,
            submitted_at: p.submitted_at,
            withdrawn_at: p.withdrawn_at,
            accepted_at: p.accepted_at,
            rejected_at: p.rejected_at,
        }
    }
}

/// Workspace listing of proposals with a total count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DatasetSubmissionsDto {
    pub total_count: usize,
    pub proposals: Vec<DatasetProposalDto>,
}

impl DatasetSubmissionsDto {
    pub fn new(proposals: Vec<DatasetProposalDto>) -> Self {
        Self {
            total_count: proposals.len(),
            proposals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proposal_accepts_legacy_key_names() {
        let dto: DatasetProposalDto = serde_json::from_value(serde_json::json!({
            "NodeId": "N:proposal:1",
            "ProposalStatus": "SUBMITTED",
            "Name": "Study A"
        }))
        .unwrap();
        assert_eq!(dto.proposal_node_id, "N:proposal:1");
        assert_eq!(dto.status, ProposalStatus::Submitted);
        assert!(dto.survey.is_empty());
    }

    #[test]
    fn proposal_serializes_wire_names() {
        let dto = DatasetProposalDto {
            proposal_node_id: "N:proposal:1".to_string(),
            ..Default::default()
        };
        let json = serde_json::to_value(&dto).unwrap();
        assert_eq!(json["ProposalNodeId"], "N:proposal:1");
        assert_eq!(json["Status"], "DRAFT");
    }

    #[test]
    fn record_round_trips_through_dto() {
        let record = DatasetProposalRecord {
            user_id: 42,
            node_id: "N:proposal:1".to_string(),
            name: "Study A".to_string(),
            repository_id: 7,
            organization_node_id: "N:organization:1".to_string(),
            proposal_status: ProposalStatus::Submitted,
            survey: vec![SurveyAnswer {
                question_id: 1,
                response: "yes".to_string(),
            }],
            contributors: vec![Contributor {
                first_name: "Grace".to_string(),
                last_name: "Hopper".to_string(),
                email_address: "grace@example.org".to_string(),
            }],
            created_at: 1,
            updated_at: 2,
            submitted_at: 2,
            ..Default::default()
        };
        let dto = DatasetProposalDto::from(&record);
        assert_eq!(dto.key(), record.key());
        assert_eq!(dto.survey_answers(), record.survey);
        assert_eq!(dto.contributor_records(), record.contributors);
        assert_eq!(dto.submitted_at, 2);
    }

    #[test]
    fn submissions_carry_total_count() {
        let listing = DatasetSubmissionsDto::new(vec![DatasetProposalDto::default(); 3]);
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json["TotalCount"], 3);
        assert_eq!(json["Proposals"].as_array().unwrap().len(), 3);
    }
}
