//! Seed data for the in-memory backends.
//!
//! ```json
//! {
//!   "documents": { "Repositories": [...], "Questions": [...], "Info": [...] },
//!   "directory": { "users": [...], "organizations": [...], "publishers": [...] }
//! }
//! ```

use std::path::{Path, PathBuf};

use publishing_relational::DirectorySeed;
use publishing_storage::SeedData;
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse seed {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Seed {
    pub documents: SeedData,
    pub directory: DirectorySeed,
}

impl Seed {
    pub fn load(path: &Path) -> Result<Self, SeedError> {
        let raw = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}
