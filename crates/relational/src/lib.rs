//! Relational store for the publishing service.
//!
//! Resolves users, organizations and publishing teams, and provisions the
//! dataset (with guest membership, contributor and owner records) for an
//! accepted proposal as one transaction.

mod error;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod record;
mod traits;

pub use error::{ProvisionStep, RelationalError};
pub use memory::{ContributorRow, DirectorySeed, MemoryDirectory};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresConfig, PostgresStore};
pub use record::{CreatedDataset, Dataset, Organization, Publisher, User};
pub use traits::RelationalStore;
