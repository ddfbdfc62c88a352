//! MongoDB document store.
//!
//! One collection per record type. Proposals are indexed on
//! `(UserId, NodeId)` (unique), `(RepositoryId, ProposalStatus)` and
//! `(OrganizationNodeId, ProposalStatus)`.

use async_trait::async_trait;
use bson::{doc, Document};
use futures_util::TryStreamExt;
use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use mongodb::options::IndexOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::record::{
    DatasetProposalRecord, InfoRecord, ProposalKey, ProposalStatus, QuestionRecord,
    RepositoryRecord,
};
use crate::traits::{InfoStore, ProposalStore, QuestionStore, RepositoryStore};

const DUPLICATE_KEY: i32 = 11000;

/// Connection settings and collection names.
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
    pub info_collection: String,
    pub repository_collection: String,
    pub question_collection: String,
    pub proposal_collection: String,
}

impl MongoConfig {
    /// Settings with the default collection names.
    pub fn new(uri: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            database: database.into(),
            info_collection: "publishing_info".to_string(),
            repository_collection: "publishing_repositories".to_string(),
            question_collection: "publishing_questions".to_string(),
            proposal_collection: "dataset_proposals".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct MongoStore {
    info: Collection<InfoRecord>,
    repositories: Collection<RepositoryRecord>,
    questions: Collection<QuestionRecord>,
    proposals: Collection<DatasetProposalRecord>,
}

fn backend(context: &str, e: MongoError) -> StorageError {
    StorageError::Backend(format!("{context}: {e}"))
}

fn is_duplicate_key(e: &MongoError) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY
    )
}

fn proposal_filter(user_id: i64, node_id: &str) -> Document {
    doc! { "UserId": user_id, "NodeId": node_id }
}

async fn find_all<T>(collection: &Collection<T>, filter: Document) -> Result<Vec<T>, StorageError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let name = collection.name().to_string();
    let cursor = collection
        .find(filter)
        .await
        .map_err(|e| backend(&format!("find in {name}"), e))?;
    cursor
        .try_collect()
        .await
        .map_err(|e| backend(&format!("read from {name}"), e))
}

/// Fetch exactly one record, distinguishing zero and several matches.
async fn find_single<T>(
    collection: &Collection<T>,
    filter: Document,
    kind: &str,
    key: String,
) -> Result<T, StorageError>
where
    T: DeserializeOwned + Unpin + Send + Sync,
{
    let mut found = find_all(collection, filter).await?;
    match found.len() {
        1 => Ok(found.remove(0)),
        0 => Err(StorageError::NotFound {
            collection: kind.to_string(),
            key,
        }),
        count => Err(StorageError::Ambiguous {
            collection: kind.to_string(),
            key,
            count,
        }),
    }
}

impl MongoStore {
    /// Connect, verify the server answers, and ensure the proposal indexes.
    pub async fn connect(config: &MongoConfig) -> Result<Self, StorageError> {
        info!(database = %config.database, "connecting to document store");
        let client = Client::with_uri_str(&config.uri)
            .await
            .map_err(|e| backend("connect", e))?;
        let db = client.database(&config.database);
        db.run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| backend("ping", e))?;

        let store = Self {
            info: db.collection(&config.info_collection),
            repositories: db.collection(&config.repository_collection),
            questions: db.collection(&config.question_collection),
            proposals: db.collection(&config.proposal_collection),
        };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> Result<(), StorageError> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "UserId": 1, "NodeId": 1 })
                .options(IndexOptions::builder().unique(true).build())
                .build(),
            IndexModel::builder()
                .keys(doc! { "RepositoryId": 1, "ProposalStatus": 1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "OrganizationNodeId": 1, "ProposalStatus": 1 })
                .build(),
        ];
        self.proposals
            .create_indexes(indexes)
            .await
            .map_err(|e| backend("create proposal indexes", e))?;

        self.repositories
            .create_index(
                IndexModel::builder()
                    .keys(doc! { "OrganizationNodeId": 1 })
                    .build(),
            )
            .await
            .map_err(|e| backend("create repository index", e))?;
        Ok(())
    }
}

#[async_trait]
impl InfoStore for MongoStore {
    async fn get_publishing_info(&self) -> Result<Vec<InfoRecord>, StorageError> {
        find_all(&self.info, doc! {}).await
    }
}

#[async_trait]
impl RepositoryStore for MongoStore {
    async fn get_repositories(&self) -> Result<Vec<RepositoryRecord>, StorageError> {
        find_all(&self.repositories, doc! {}).await
    }

    async fn get_repository(
        &self,
        organization_node_id: &str,
    ) -> Result<RepositoryRecord, StorageError> {
        find_single(
            &self.repositories,
            doc! { "OrganizationNodeId": organization_node_id },
            "repository",
            organization_node_id.to_string(),
        )
        .await
    }
}

#[async_trait]
impl QuestionStore for MongoStore {
    async fn get_questions(&self) -> Result<Vec<QuestionRecord>, StorageError> {
        find_all(&self.questions, doc! {}).await
    }
}

#[async_trait]
impl ProposalStore for MongoStore {
    async fn get_dataset_proposal(
        &self,
        user_id: i64,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, StorageError> {
        self.proposals
            .find_one(proposal_filter(user_id, node_id))
            .await
            .map_err(|e| backend("get dataset proposal", e))?
            .ok_or_else(|| StorageError::proposal_not_found(user_id, node_id))
    }

    async fn get_dataset_proposals_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<DatasetProposalRecord>, StorageError> {
        find_all(&self.proposals, doc! { "UserId": user_id }).await
    }

    async fn get_dataset_proposals_for_workspace(
        &self,
        organization_node_id: &str,
        status: ProposalStatus,
    ) -> Result<Vec<DatasetProposalRecord>, StorageError> {
        find_all(
            &self.proposals,
            doc! {
                "OrganizationNodeId": organization_node_id,
                "ProposalStatus": status.as_str(),
            },
        )
        .await
    }

    async fn get_dataset_proposal_for_repository(
        &self,
        repository_id: i64,
        status: ProposalStatus,
        node_id: &str,
    ) -> Result<DatasetProposalRecord, StorageError> {
        find_single(
            &self.proposals,
            doc! {
                "RepositoryId": repository_id,
                "ProposalStatus": status.as_str(),
                "NodeId": node_id,
            },
            "dataset proposal",
            format!("{repository_id}/{status}/{node_id}"),
        )
        .await
    }

    async fn create_dataset_proposal(
        &self,
        record: &DatasetProposalRecord,
    ) -> Result<(), StorageError> {
        match self.proposals.insert_one(record).await {
            Ok(_) => Ok(()),
            Err(e) if is_duplicate_key(&e) => Err(StorageError::AlreadyExists {
                user_id: record.user_id,
                node_id: record.node_id.clone(),
            }),
            Err(e) => Err(backend("create dataset proposal", e)),
        }
    }

    async fn update_dataset_proposal(
        &self,
        record: &DatasetProposalRecord,
    ) -> Result<(), StorageError> {
        let result = self
            .proposals
            .replace_one(proposal_filter(record.user_id, &record.node_id), record)
            .await
            .map_err(|e| backend("update dataset proposal", e))?;
        if result.matched_count == 0 {
            return Err(StorageError::proposal_not_found(
                record.user_id,
                &record.node_id,
            ));
        }
        Ok(())
    }

    async fn update_dataset_proposal_if(
        &self,
        record: &DatasetProposalRecord,
        expected: ProposalStatus,
    ) -> Result<(), StorageError> {
        let mut filter = proposal_filter(record.user_id, &record.node_id);
        filter.insert("ProposalStatus", expected.as_str());

        let result = self
            .proposals
            .replace_one(filter, record)
            .await
            .map_err(|e| backend("conditional update of dataset proposal", e))?;
        if result.matched_count == 1 {
            return Ok(());
        }

        // Nothing matched: either the record is gone or its status moved.
        let current = self.get_dataset_proposal(record.user_id, &record.node_id).await?;
        debug!(
            user_id = record.user_id,
            node_id = %record.node_id,
            stored = %current.proposal_status,
            expected = %expected,
            "conditional write rejected"
        );
        Err(StorageError::Conflict {
            user_id: record.user_id,
            node_id: record.node_id.clone(),
            expected,
        })
    }

    async fn delete_dataset_proposal(&self, key: &ProposalKey) -> Result<(), StorageError> {
        self.proposals
            .delete_one(proposal_filter(key.user_id, &key.node_id))
            .await
            .map_err(|e| backend("delete dataset proposal", e))?;
        Ok(())
    }
}
