//! Environment-driven settings for the helper binaries.
//!
//! - `AGENT_REGISTRY_DB` selects the SQLite database file.
//! - `AGENT_REGISTRY_OWNER` supplies a default owner for `publish`.
//!
//! Command-line flags override both.

use crate::registry::{SqliteStore, StoreError};
use std::env;
use std::path::{Path, PathBuf};

pub const DB_ENV: &str = "AGENT_REGISTRY_DB";
pub const OWNER_ENV: &str = "AGENT_REGISTRY_OWNER";
pub const DEFAULT_DB_PATH: &str = "agent-registry.db";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RegistryConfig {
    pub db_path: PathBuf,
    pub default_owner: Option<String>,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            default_owner: None,
        }
    }
}

impl RegistryConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        Self {
            db_path: read(DB_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            default_owner: read(OWNER_ENV),
        }
    }

    pub fn with_db_path(mut self, path: impl AsRef<Path>) -> Self {
        self.db_path = path.as_ref().to_path_buf();
        self
    }

    pub fn open_store(&self) -> Result<SqliteStore, StoreError> {
        SqliteStore::open(&self.db_path)
    }
}
