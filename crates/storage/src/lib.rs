//! Document store for the publishing service.
//!
//! Record types for information documents, repositories, survey questions,
//! and dataset proposals, the traits a backend implements, and two backends:
//! an in-memory store for development and tests, and a MongoDB store
//! (feature `mongo`).

pub mod conformance;
mod error;
mod memory;
#[cfg(feature = "mongo")]
mod mongo;
mod record;
mod traits;

pub use error::StorageError;
pub use memory::{MemoryStore, SeedData};
#[cfg(feature = "mongo")]
pub use mongo::{MongoConfig, MongoStore};
pub use record::{
    Contributor, DatasetProposalRecord, FileLocation, InfoRecord, ProposalKey, ProposalStatus,
    QuestionRecord, RepositoryRecord, SurveyAnswer, UnknownStatus,
};
pub use traits::{InfoStore, ProposalStore, PublishingStore, QuestionStore, RepositoryStore};
