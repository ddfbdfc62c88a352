//! In-process document store.
//!
//! Used by the development server (`--document-store memory`) and by the
//! conformance suite. All collections live behind one `RwLock`, so every
//! conditional write is atomic with respect to every other operation.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::error::StorageError;
use crate::record::{
    DatasetProposalRecord, InfoRecord, ProposalKey, ProposalStatus, QuestionRecord,
    RepositoryRecord,
};
use crate::traits::{InfoStore, ProposalStore, QuestionStore, RepositoryStore};

/// Initial contents for a [`MemoryStore`], usually read from a JSON file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SeedData {
    pub info: Vec<InfoRecord>,
    pub repositories: Vec<RepositoryRecord>,
    pub questions: Vec<QuestionRecord>,
    pub proposals: Vec<DatasetProposalRecord>,
}

#[derive(Default)]
struct Collections {
    info: Vec<InfoRecord>,
    repositories: Vec<RepositoryRecord>,
    questions: Vec<QuestionRecord>,
    proposals: BTreeMap<ProposalKey, DatasetProposalRecord>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `seed`. Later proposals with a
    /// duplicate key replace earlier ones.
    pub fn with_seed(seed: SeedData) -> Self {
        let proposals = seed
            .proposals
            .into_iter()
            .map(|p| (p.key(), p))
            .collect();
        Self {
            inner: RwLock::new(Collections {
                info: seed.info,
                repositories: seed.repositories,
                questions: seed.questions,
                proposals,
            }),
        }
    }

    pub async fn insert_repository(&self, repository: RepositoryRecord) {
        self.inner.write().await.repositories.push(repository);
    }

    pub async fn insert_question(&self, question: QuestionRecord) {
        self.inner.write().await.questions.push(question);
    }

    pub async fn insert_info(&self, info: InfoRecord) {
        self.inner.write().await.info.push(info);
    }
}

#[async_trait]
impl InfoStore for MemoryStore {
    async fn get_publishing_info(&self) -> Result<Vec<InfoRecord>, StorageError> {
        Ok(self.inner.read().await.info.clone())
    }
}

#[async_trait]
impl RepositoryStore for MemoryStore {
    async fn get_repositories(&self) -> Result<Vec<RepositoryRecord>, StorageError> {
        Ok(self.inner.read().await.repositories.clone())
    }

    async fn get_repository(
        &self,
        organization_node_id: &str,
    ) -> Result<RepositoryRecord, StorageError> {
        let inner = self.inner.read().await;
        let matches: Vec<&RepositoryRecord> = inner
            .repositories
            .iter()
            .filter(|r| r.organization_node_id == organization_node_id)
            .collect();
        match matches.as_slice() {
            [one] => Ok((*one).clone()),
            [] => Err(StorageError::NotFound {
                collection: "repository".to_string(),
                key: organization_node_id.to_string(),
            }),
            many => Err(StorageError::Ambiguous {
                collection: "repository".to_string(),
                key: organization_node_id.to_string(),
                count: many.len(),
            }),
        }
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn get_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        Ok(self.inner.read().await.questions.clone())
    }
}

#[async_trait]
impl ProposalStore for MemoryStore {
    async fn get_dataset_proposal(
        &self,
        user_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, StorageError> {
        let key = ProposalKey {
            user_id,
            node_id: node_id.to_string(),
        };
        self.inner
            .read()
            .await
            .proposals
            .get(&key)
            .cloned()
            .ok_or_else(|| StorageError::proposal_not_found(user_id, node_id))
    }

    async fn get_dataset_proposals_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<DatasetProposalRecord>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .proposals
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_dataset_proposals_for_workspace(
        &self,
        organization_node_id: &str,
        status: ProposalStatus,
    ) -> Result<Vec<DatasetProposalRecord>, StorageError> {
        Ok(self
            .inner
            .read()
            .await
            .proposals
            .values()
            .filter(|p| {
                p.organization_node_id == organization_node_id && p.proposal_status == status
            })
            .cloned()
            .collect())
    }

    async fn get_dataset_proposal_for_repository(
        &self,
        repository_id: i64,
        status: ProposalStatus,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, StorageError> {
        let inner = self.inner.read().await;
        let matches: Vec<&DatasetProposalRecord> = inner
            .proposals
            .values()
            .filter(|p| {
                p.repository_id == repository_id
                    && p.proposal_status == status
                    && p.node_id == node_id
            })
            .collect();
        let key = format!("{repository_id}/{status}/{node_id}");
        match matches.as_slice() {
            [one] => Ok((*one).clone()),
            [] => Err(StorageError::NotFound {
                collection: "dataset proposal".to_string(),
                key,
            }),
            many => Err(StorageError::Ambiguous {
                collection: "dataset proposal".to_string(),
                key,
                count: many.len(),
            }),
        }
    }

    async fn create_dataset_proposal(
        &self,
        record: &DatasetProposalRecord,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let key = record.key();
        if inner.proposals.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                user_id: key.user_id,
                node_id: key.node_id,
            });
        }
        inner.proposals.insert(key, record.clone());
        Ok(())
    }

    async fn update_dataset_proposal(
        &self,
        record: &DatasetProposalRecord,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        match inner.proposals.get_mut(&record.key()) {
            Some(stored) => {
                *stored = record.clone();
                Ok(())
            }
            None => Err(StorageError::proposal_not_found(
                record.user_id,
                &record.node_id,
            )),
        }
    }

    async fn update_dataset_proposal_if(
        &self,
        record: &DatasetProposalRecord,
        expected: ProposalStatus,
    ) -> Result<(), StorageError> {
        let mut inner = self.inner.write().await;
        let Some(stored) = inner.proposals.get_mut(&record.key()) else {
            return Err(StorageError::proposal_not_found(
                record.user_id,
                &record.node_id,
            ));
        };
        if stored.proposal_status != expected {
            return Err(StorageError::Conflict {
                user_id: record.user_id,
                node_id: record.node_id.clone(),
                expected,
            });
        }
        *stored = record.clone();
        Ok(())
    }

    async fn delete_dataset_proposal(&self, key: &ProposalKey) -> Result<(), StorageError> {
        self.inner.write().await.proposals.remove(key);
        Ok(())
    }
}
