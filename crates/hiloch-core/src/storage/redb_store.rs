//! # redb-backed Key-Value Store
//!
//! A disk-backed string store using the redb embedded database. It stands in
//! for the platform's secure store on hosts that have none, providing:
//! - ACID transactions
//! - Crash safety (copy-on-write B-trees)
//! - Zero configuration

use super::KeyValueStore;
use crate::HilochError;
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use std::path::Path;

/// Table for values: key string -> value string
const VALUES: TableDefinition<&str, &str> = TableDefinition::new("values");

fn io_err(e: impl std::fmt::Display) -> HilochError {
    HilochError::IoError(e.to_string())
}

/// A disk-backed key-value store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore").finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HilochError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize the table if it doesn't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(VALUES).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// All stored keys, in order.
    pub fn keys(&self) -> Result<Vec<String>, HilochError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(VALUES).map_err(io_err)?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, _) = entry.map_err(io_err)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

impl KeyValueStore for RedbStore {
    fn get(&self, key: &str) -> Result<Option<String>, HilochError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(VALUES).map_err(io_err)?;
        Ok(table
            .get(key)
            .map_err(io_err)?
            .map(|v| v.value().to_string()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HilochError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(VALUES).map_err(io_err)?;
            table.insert(key, value).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn delete(&mut self, key: &str) -> Result<(), HilochError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(VALUES).map_err(io_err)?;
            table.remove(key).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }
}
