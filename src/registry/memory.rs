//! In-process record store.
//!
//! Records live in a `BTreeMap` keyed by identity, with a secondary
//! `SkillId -> keys` index so skill search touches only matching records.
//! Every operation runs under one mutex, which makes insert atomic.

use crate::card::{IdentityKey, SkillId};
use crate::registry::StoredAgentRecord;
use crate::registry::store::{RecordQuery, RecordStore, StoreError};
use crate::registry::version_order::version_sort_key;
use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard};

#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    records: BTreeMap<IdentityKey, StoredAgentRecord>,
    by_skill: BTreeMap<SkillId, BTreeSet<IdentityKey>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking reader cannot leave the maps half-written; inserts
        // touch them only after every fallible step.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl RecordStore for MemoryStore {
    fn ensure_indexes(&self) -> Result<(), StoreError> {
        Ok(())
    }

    fn insert(&self, record: &StoredAgentRecord) -> Result<(), StoreError> {
        let key = record.card.identity();
        let mut inner = self.lock();
        if inner.records.contains_key(&key) {
            return Err(StoreError::DuplicateKey(key));
        }
        for skill in record.card.skill_ids() {
            inner
                .by_skill
                .entry(skill.clone())
                .or_default()
                .insert(key.clone());
        }
        inner.records.insert(key, record.clone());
        Ok(())
    }

    fn find_by_key(&self, key: &IdentityKey) -> Result<Option<StoredAgentRecord>, StoreError> {
        Ok(self.lock().records.get(key).cloned())
    }

    fn query(&self, query: &RecordQuery) -> Result<Vec<StoredAgentRecord>, StoreError> {
        let inner = self.lock();
        let mut matched: Vec<StoredAgentRecord> = match &query.skill {
            Some(skill) => inner
                .by_skill
                .get(skill)
                .into_iter()
                .flatten()
                .filter_map(|key| inner.records.get(key))
                .filter(|record| query.matches(record))
                .cloned()
                .collect(),
            None => inner
                .records
                .values()
                .filter(|record| query.matches(record))
                .cloned()
                .collect(),
        };
        drop(inner);

        matched.sort_by_cached_key(|record| {
            (
                record.card.name.clone(),
                Reverse(version_sort_key(&record.card.version)),
                Reverse(record.card.version.clone()),
            )
        });
        Ok(query.page.apply(matched))
    }
}
