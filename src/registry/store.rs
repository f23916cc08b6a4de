//! Storage seam for published records.
//!
//! A store only has to offer an atomic, uniquely-constrained insert, a point
//! read by identity key and a filtered, ordered, paginated query. The
//! registry builds idempotent publication on top of those three primitives.

use crate::card::{IdentityKey, RecordStatus, SkillId};
use crate::registry::StoredAgentRecord;
use crate::registry::pagination::Page;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The unique `(name, version)` constraint rejected an insert.
    #[error("a record for {0} already exists")]
    DuplicateKey(IdentityKey),

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("encoding stored card: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("preparing store at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored record {id} is unreadable: {detail}")]
    Corrupt { id: String, detail: String },
}

impl StoreError {
    pub fn is_duplicate_key(&self) -> bool {
        matches!(self, StoreError::DuplicateKey(_))
    }
}

/// Optional equality filters shared by list and search.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RecordFilter {
    pub owner: Option<String>,
    pub status: Option<RecordStatus>,
}

impl RecordFilter {
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn status(mut self, status: RecordStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, record: &StoredAgentRecord) -> bool {
        self.owner.as_ref().is_none_or(|owner| owner == &record.owner)
            && self.status.is_none_or(|status| status == record.status)
    }
}

/// One read against the store. Results are ordered by name ascending, then
/// by version precedence descending, and the page is applied last.
#[derive(Clone, Debug, Default)]
pub struct RecordQuery {
    pub name: Option<String>,
    pub skill: Option<SkillId>,
    pub filter: RecordFilter,
    pub page: Page,
}

impl RecordQuery {
    pub fn matches(&self, record: &StoredAgentRecord) -> bool {
        self.name.as_ref().is_none_or(|name| name == &record.card.name)
            && self
                .skill
                .as_ref()
                .is_none_or(|skill| record.card.has_skill(skill))
            && self.filter.matches(record)
    }
}

pub trait RecordStore: Send + Sync {
    /// Create the uniqueness constraint and skill index. Safe to repeat.
    fn ensure_indexes(&self) -> Result<(), StoreError>;

    /// Insert a new record, failing with [`StoreError::DuplicateKey`] when
    /// its identity key is already bound.
    fn insert(&self, record: &StoredAgentRecord) -> Result<(), StoreError>;

    fn find_by_key(&self, key: &IdentityKey) -> Result<Option<StoredAgentRecord>, StoreError>;

    fn query(&self, query: &RecordQuery) -> Result<Vec<StoredAgentRecord>, StoreError>;
}
