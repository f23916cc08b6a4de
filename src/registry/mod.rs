//! Content-addressed registry of agent cards.
//!
//! An identity key moves from absent to published exactly once. Publishing
//! is an optimistic insert against the store's unique constraint; when the
//! key is taken, the existing record is re-read and its fingerprint decides
//! between an idempotent no-op and an immutability conflict. No record is
//! ever updated in place.

pub mod memory;
pub mod pagination;
pub mod sqlite;
pub mod store;
pub mod version_order;

pub use memory::MemoryStore;
pub use pagination::{DEFAULT_LIMIT, MAX_LIMIT, Page, Pagination};
pub use sqlite::SqliteStore;
pub use store::{RecordFilter, RecordQuery, RecordStore, StoreError};
pub use version_order::version_sort_key;

use crate::card::{AgentCard, Fingerprint, IdentityKey, RecordId, RecordStatus, SkillId};
use crate::card_validation::SchemaValidator;
use crate::error::{ConflictKind, RegistryError};
use crate::fingerprint::fingerprint_card;
use crate::transport_policy::check_transport_consistency;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// The persisted unit: a card plus ownership and content identity.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAgentRecord {
    pub id: RecordId,
    pub card: AgentCard,
    pub owner: String,
    pub published_at: DateTime<Utc>,
    pub status: RecordStatus,
    pub fingerprint: Fingerprint,
}

impl StoredAgentRecord {
    /// Wrap `card` as a freshly published record stamped with the current time.
    pub fn new_published(card: AgentCard, owner: impl Into<String>) -> Result<Self, RegistryError> {
        let fingerprint = fingerprint_card(&card)?;
        Ok(Self {
            id: RecordId::generate(),
            card,
            owner: owner.into(),
            published_at: Utc::now().trunc_subsecs(3),
            status: RecordStatus::Published,
            fingerprint,
        })
    }

    pub fn identity(&self) -> IdentityKey {
        self.card.identity()
    }
}

pub struct Registry<S> {
    store: S,
    validator: Arc<SchemaValidator>,
}

impl<S: RecordStore> Registry<S> {
    pub fn new(store: S, validator: Arc<SchemaValidator>) -> Self {
        Self { store, validator }
    }

    /// Build a registry around `store` with the embedded card contract.
    pub fn with_embedded_schema(store: S) -> anyhow::Result<Self> {
        Ok(Self::new(store, Arc::new(SchemaValidator::new()?)))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn validator(&self) -> &SchemaValidator {
        &self.validator
    }

    /// Validate, check transport policy, decode, then publish.
    ///
    /// Rejected candidates never reach the store.
    pub fn submit(&self, candidate: &Value, owner: &str) -> Result<StoredAgentRecord, RegistryError> {
        let card = self
            .validator
            .validate_card(candidate)
            .map_err(|errors| RegistryError::Validation { errors })?;

        let policy_errors = check_transport_consistency(&card);
        if !policy_errors.is_empty() {
            return Err(RegistryError::TransportPolicy {
                errors: policy_errors,
            });
        }

        self.publish(card, owner)
    }

    /// Bind `card` to its `(name, version)` key, or return the record that
    /// already holds identical content.
    pub fn publish(&self, card: AgentCard, owner: &str) -> Result<StoredAgentRecord, RegistryError> {
        let record = StoredAgentRecord::new_published(card, owner)?;
        match self.store.insert(&record) {
            Ok(()) => {
                tracing::info!(
                    name = %record.card.name,
                    version = %record.card.version,
                    owner = %record.owner,
                    fingerprint = %record.fingerprint,
                    "published agent card"
                );
                Ok(record)
            }
            Err(StoreError::DuplicateKey(key)) => self.resolve_existing(key, record.fingerprint),
            Err(err) => Err(err.into()),
        }
    }

    fn resolve_existing(
        &self,
        key: IdentityKey,
        attempted: Fingerprint,
    ) -> Result<StoredAgentRecord, RegistryError> {
        // Records are never deleted, so the key that rejected the insert
        // must still be readable.
        let Some(existing) = self.store.find_by_key(&key)? else {
            return Err(StoreError::DuplicateKey(key).into());
        };

        if existing.fingerprint == attempted {
            tracing::debug!(
                name = %key.name,
                version = %key.version,
                fingerprint = %attempted,
                "identical agent card already published"
            );
            return Ok(existing);
        }

        tracing::warn!(
            name = %key.name,
            version = %key.version,
            existing = %existing.fingerprint,
            attempted = %attempted,
            "rejected different content for published agent card"
        );
        Err(RegistryError::Conflict {
            kind: ConflictKind::Immutable,
            key,
            existing: existing.fingerprint,
            attempted,
        })
    }

    pub fn find_by_identity(
        &self,
        name: &str,
        version: &str,
    ) -> Result<Option<StoredAgentRecord>, RegistryError> {
        Ok(self.store.find_by_key(&IdentityKey::new(name, version))?)
    }

    /// Every version of `name`, highest precedence first.
    pub fn find_by_name(
        &self,
        name: &str,
        pagination: &Pagination,
    ) -> Result<Vec<StoredAgentRecord>, RegistryError> {
        let query = RecordQuery {
            name: Some(name.to_string()),
            page: pagination.normalize(),
            ..RecordQuery::default()
        };
        Ok(self.store.query(&query)?)
    }

    pub fn latest(&self, name: &str) -> Result<Option<StoredAgentRecord>, RegistryError> {
        let mut first = self.find_by_name(name, &Pagination::new(Some(1), None))?;
        Ok(first.pop())
    }

    pub fn list_all(
        &self,
        pagination: &Pagination,
        filter: &RecordFilter,
    ) -> Result<Vec<StoredAgentRecord>, RegistryError> {
        let query = RecordQuery {
            filter: filter.clone(),
            page: pagination.normalize(),
            ..RecordQuery::default()
        };
        Ok(self.store.query(&query)?)
    }

    /// Records whose card declares a skill with identifier `skill`.
    pub fn search_by_skill(
        &self,
        skill: &SkillId,
        pagination: &Pagination,
        filter: &RecordFilter,
    ) -> Result<Vec<StoredAgentRecord>, RegistryError> {
        let query = RecordQuery {
            skill: Some(skill.clone()),
            filter: filter.clone(),
            page: pagination.normalize(),
            ..RecordQuery::default()
        };
        Ok(self.store.query(&query)?)
    }
}
