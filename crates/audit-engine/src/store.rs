//! Persistence interfaces the engine is handed: a keyed suspension store
//! for checkpoints and an append-only history store for completion records.
//!
//! In-memory implementations live here; filesystem-backed ones are in the
//! `audit-store` crate.

use std::collections::BTreeMap;
use std::path::PathBuf;

use uuid::Uuid;

use crate::history::CompletionRecord;

/// Errors from a persistence backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store I/O error at {path}: {detail}")]
    Io { path: PathBuf, detail: String },

    #[error("corrupt store entry at {path}: {detail}")]
    Corrupt { path: PathBuf, detail: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Storage key of a suspended session.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SuspensionKey {
    pub dossier_key: String,
    pub control_type: String,
}

impl SuspensionKey {
    pub fn new(dossier_key: impl Into<String>, control_type: impl Into<String>) -> Self {
        Self {
            dossier_key: dossier_key.into(),
            control_type: control_type.into(),
        }
    }
}

/// Keyed checkpoint storage, at most one snapshot per key.
pub trait SuspensionStore {
    fn get(&self, key: &SuspensionKey) -> Result<Option<Vec<u8>>, StoreError>;

    /// Store `snapshot` under `key`, replacing what was there.
    fn put(&mut self, key: &SuspensionKey, snapshot: Vec<u8>) -> Result<(), StoreError>;

    /// Returns whether an entry was removed.
    fn remove(&mut self, key: &SuspensionKey) -> Result<bool, StoreError>;

    fn keys(&self) -> Result<Vec<SuspensionKey>, StoreError>;
}

/// Append-only log of completed sessions.
pub trait HistoryStore {
    fn append(&mut self, record: &CompletionRecord) -> Result<(), StoreError>;

    /// Every record, oldest first.
    fn list(&self) -> Result<Vec<CompletionRecord>, StoreError>;

    fn find(&self, session_id: Uuid) -> Result<Option<CompletionRecord>, StoreError> {
        Ok(self
            .list()?
            .into_iter()
            .find(|record| record.session_id == session_id))
    }
}

#[derive(Debug, Default)]
pub struct MemorySuspensionStore {
    entries: BTreeMap<SuspensionKey, Vec<u8>>,
}

impl MemorySuspensionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SuspensionStore for MemorySuspensionStore {
    fn get(&self, key: &SuspensionKey) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &SuspensionKey, snapshot: Vec<u8>) -> Result<(), StoreError> {
        self.entries.insert(key.clone(), snapshot);
        Ok(())
    }

    fn remove(&mut self, key: &SuspensionKey) -> Result<bool, StoreError> {
        Ok(self.entries.remove(key).is_some())
    }

    fn keys(&self) -> Result<Vec<SuspensionKey>, StoreError> {
        Ok(self.entries.keys().cloned().collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryHistoryStore {
    records: Vec<CompletionRecord>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryStore for MemoryHistoryStore {
    fn append(&mut self, record: &CompletionRecord) -> Result<(), StoreError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<CompletionRecord>, StoreError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_suspension_store_overwrites() {
        let mut store = MemorySuspensionStore::new();
        let key = SuspensionKey::new("abc", "lcb-ft");
        store.put(&key, vec![1]).unwrap();
        store.put(&key, vec![2]).unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(&key).unwrap(), Some(vec![2]));
        assert!(store.remove(&key).unwrap());
        assert!(!store.remove(&key).unwrap());
        assert!(store.is_empty());
    }

    #[test]
    fn memory_history_starts_empty() {
        let store = MemoryHistoryStore::new();
        assert!(store.list().unwrap().is_empty());
        assert!(store.find(Uuid::new_v4()).unwrap().is_none());
    }
}
