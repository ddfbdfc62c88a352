//! Dataset proposal publishing.
//!
//! [`PublishingService`] runs proposal CRUD and the lifecycle
//! (`DRAFT → SUBMITTED → WITHDRAWN | ACCEPTED | REJECTED`) on top of a
//! document store, a relational store, and an email notifier.

mod clock;
mod dto;
mod error;
mod lifecycle;
mod presign;
mod service;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dto::{
    ContributorDto, DatasetProposalDto, DatasetSubmissionsDto, InfoDto, QuestionDto,
    RepositoryDto, SurveyDto,
};
pub use error::ServiceError;
pub use lifecycle::{missing_questions, Transition};
pub use presign::{SignedUrlSigner, UrlSigner};
pub use service::{PublishingService, ServiceConfig};
