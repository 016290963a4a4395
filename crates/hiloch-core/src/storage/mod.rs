//! # Storage
//!
//! The persistence collaborator: an opaque string-keyed store with get, set
//! and delete. Values are plain strings (ISO dates, JSON arrays).
//!
//! Two backends:
//! - `InMemory`: a `BTreeMap` (tests, ephemeral runs)
//! - `Persistent`: [`RedbStore`] for disk-backed ACID storage

mod redb_store;

pub use redb_store::RedbStore;

use crate::HilochError;
use std::collections::BTreeMap;
use std::path::Path;

/// String-keyed store. Every operation may fail; callers decide whether a
/// failure is fatal.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, HilochError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), HilochError>;
    /// Deleting a missing key is not an error.
    fn delete(&mut self, key: &str) -> Result<(), HilochError>;
}

/// Volatile store backed by a `BTreeMap`.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, HilochError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HilochError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), HilochError> {
        self.values.remove(key);
        Ok(())
    }
}

/// Storage backend selected by the host.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory map (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl StorageBackend {
    /// Open a redb store at the given path.
    pub fn redb(path: impl AsRef<Path>) -> Result<Self, HilochError> {
        Ok(Self::Persistent(RedbStore::open(path)?))
    }

    /// Check if using persistent storage.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, StorageBackend::Persistent(_))
    }
}

impl KeyValueStore for StorageBackend {
    fn get(&self, key: &str) -> Result<Option<String>, HilochError> {
        match self {
            StorageBackend::InMemory(s) => s.get(key),
            StorageBackend::Persistent(s) => s.get(key),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HilochError> {
        match self {
            StorageBackend::InMemory(s) => s.set(key, value),
            StorageBackend::Persistent(s) => s.set(key, value),
        }
    }

    fn delete(&mut self, key: &str) -> Result<(), HilochError> {
        match self {
            StorageBackend::InMemory(s) => s.delete(key),
            StorageBackend::Persistent(s) => s.delete(key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_operations() {
        let mut store = MemoryStore::new();
        assert!(store.is_empty());
        store.set("k", "v").expect("set");
        assert_eq!(store.get("k").expect("get").as_deref(), Some("v"));
        assert_eq!(store.len(), 1);
        store.delete("k").expect("delete");
        store.delete("k").expect("delete twice");
        assert_eq!(store.get("k").expect("get"), None);
    }

    #[test]
    fn default_backend_is_volatile() {
        let backend = StorageBackend::default();
        assert!(!backend.is_persistent());
    }
}
