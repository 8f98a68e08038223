//! Persistent wallet storage using redb.
//!
//! One redb database per wallet, either a file
//! (`<root>/wallet/<id>/wallet.redb`) or redb's in-memory backend.
//! This layer stores opaque bytes; record sealing and unlocking live in
//! [`crate::wallet`].

use crate::error::WalletError;
use redb::backends::InMemoryBackend;
use redb::{Database, ReadableTable, TableDefinition};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// File name of a wallet database inside its directory
pub const WALLET_FILE: &str = "wallet.redb";

// Table definitions
const META_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("wallet_meta");
const KEYS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("keys");
const DIDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("dids");
const THEIR_DIDS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("their_dids");

/// Record tables inside a wallet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordTable {
    /// verkey → sealed key record
    Keys,
    /// did → sealed DID record
    Dids,
    /// did → sealed record of another party's DID
    TheirDids,
}

impl RecordTable {
    fn definition(self) -> TableDefinition<'static, &'static str, &'static [u8]> {
        match self {
            RecordTable::Keys => KEYS_TABLE,
            RecordTable::Dids => DIDS_TABLE,
            RecordTable::TheirDids => THEIR_DIDS_TABLE,
        }
    }
}

/// Directory holding one wallet's database under a storage root.
pub fn wallet_dir(root: &Path, id: &str) -> PathBuf {
    root.join("wallet").join(id)
}

/// Handle to one wallet's redb database.
#[derive(Clone)]
pub struct WalletStore {
    db: Arc<Database>,
}

impl std::fmt::Debug for WalletStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletStore").finish_non_exhaustive()
    }
}

impl WalletStore {
    /// Create a new file-backed wallet database.
    ///
    /// This will:
    /// - Create the wallet directory if it doesn't exist
    /// - Initialize the database file
    /// - Create all required tables
    pub fn create_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::create(path)?;
        Self::init(db)
    }

    /// Open an existing file-backed wallet database.
    pub fn open_file(path: impl AsRef<Path>) -> Result<Self, WalletError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(WalletError::NotFound(path.display().to_string()));
        }
        let db = Database::open(path)?;
        Self::init(db)
    }

    /// Create a wallet database on redb's in-memory backend.
    pub fn in_memory() -> Result<Self, WalletError> {
        let db = Database::builder().create_with_backend(InMemoryBackend::new())?;
        Self::init(db)
    }

    fn init(db: Database) -> Result<Self, WalletError> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(META_TABLE)?;
            let _ = write_txn.open_table(KEYS_TABLE)?;
            let _ = write_txn.open_table(DIDS_TABLE)?;
            let _ = write_txn.open_table(THEIR_DIDS_TABLE)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Metadata Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Save a metadata value, overwriting any previous value.
    pub fn put_meta(&self, name: &str, value: &[u8]) -> Result<(), WalletError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(META_TABLE)?;
            table.insert(name, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Load a metadata value.
    pub fn get_meta(&self, name: &str) -> Result<Option<Vec<u8>>, WalletError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(META_TABLE)?;
        Ok(table.get(name)?.map(|v| v.value().to_vec()))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Record Operations
    // ═══════════════════════════════════════════════════════════════════════

    /// Insert a record only if its name is free.
    ///
    /// Returns `false` (and writes nothing) if the name already exists.
    pub fn insert_new(
        &self,
        table: RecordTable,
        name: &str,
        value: &[u8],
    ) -> Result<bool, WalletError> {
        let write_txn = self.db.begin_write()?;
        let inserted = {
            let mut t = write_txn.open_table(table.definition())?;
            if t.get(name)?.is_some() {
                false
            } else {
                t.insert(name, value)?;
                true
            }
        };
        if inserted {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(inserted)
    }

    /// Overwrite an existing record.
    ///
    /// Returns `false` if no record with this name exists.
    pub fn update(&self, table: RecordTable, name: &str, value: &[u8]) -> Result<bool, WalletError> {
        let write_txn = self.db.begin_write()?;
        let updated = {
            let mut t = write_txn.open_table(table.definition())?;
            if t.get(name)?.is_some() {
                t.insert(name, value)?;
                true
            } else {
                false
            }
        };
        write_txn.commit()?;
        Ok(updated)
    }

    /// Insert or overwrite a record.
    pub fn put(&self, table: RecordTable, name: &str, value: &[u8]) -> Result<(), WalletError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table.definition())?;
            t.insert(name, value)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Move a record to a new name, storing `value` under it, in one transaction.
    ///
    /// Returns `false` (and writes nothing) if `from` is missing or `to` is
    /// already taken by another record.
    pub fn rename(
        &self,
        table: RecordTable,
        from: &str,
        to: &str,
        value: &[u8],
    ) -> Result<bool, WalletError> {
        let write_txn = self.db.begin_write()?;
        let moved = {
            let mut t = write_txn.open_table(table.definition())?;
            let source_exists = t.get(from)?.is_some();
            let target_taken = from != to && t.get(to)?.is_some();
            if source_exists && !target_taken {
                t.remove(from)?;
                t.insert(to, value)?;
                true
            } else {
                false
            }
        };
        if moved {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(moved)
    }

    /// Load a record by name.
    pub fn get(&self, table: RecordTable, name: &str) -> Result<Option<Vec<u8>>, WalletError> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table.definition())?;
        Ok(t.get(name)?.map(|v| v.value().to_vec()))
    }

    /// All records of a table, ordered by name.
    pub fn list(&self, table: RecordTable) -> Result<Vec<(String, Vec<u8>)>, WalletError> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table.definition())?;

        let mut records = Vec::new();
        for entry in t.iter()? {
            let (name, value) = entry?;
            records.push((name.value().to_string(), value.value().to_vec()));
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_file_store_persists() {
        let temp = TempDir::new().unwrap();
        let path = wallet_dir(temp.path(), "w1").join(WALLET_FILE);

        {
            let store = WalletStore::create_file(&path).unwrap();
            store.put_meta("salt", b"abc").unwrap();
            assert!(store.insert_new(RecordTable::Dids, "did1", b"v1").unwrap());
        }

        let reopened = WalletStore::open_file(&path).unwrap();
        assert_eq!(reopened.get_meta("salt").unwrap(), Some(b"abc".to_vec()));
        assert_eq!(
            reopened.get(RecordTable::Dids, "did1").unwrap(),
            Some(b"v1".to_vec())
        );
    }

    #[test]
    fn test_open_missing_file_is_not_found() {
        let temp = TempDir::new().unwrap();
        let result = WalletStore::open_file(temp.path().join("nope").join(WALLET_FILE));
        assert!(matches!(result, Err(WalletError::NotFound(_))));
    }

    #[test]
    fn test_insert_new_rejects_duplicates() {
        let store = WalletStore::in_memory().unwrap();

        assert!(store.insert_new(RecordTable::Keys, "vk", b"first").unwrap());
        assert!(!store.insert_new(RecordTable::Keys, "vk", b"second").unwrap());
        assert_eq!(
            store.get(RecordTable::Keys, "vk").unwrap(),
            Some(b"first".to_vec())
        );
    }

    #[test]
    fn test_update_requires_existing() {
        let store = WalletStore::in_memory().unwrap();

        assert!(!store.update(RecordTable::Dids, "missing", b"x").unwrap());
        store.insert_new(RecordTable::Dids, "d", b"old").unwrap();
        assert!(store.update(RecordTable::Dids, "d", b"new").unwrap());
        assert_eq!(store.get(RecordTable::Dids, "d").unwrap(), Some(b"new".to_vec()));
    }

    #[test]
    fn test_put_overwrites() {
        let store = WalletStore::in_memory().unwrap();

        store.put(RecordTable::TheirDids, "d", b"one").unwrap();
        store.put(RecordTable::TheirDids, "d", b"two").unwrap();
        assert_eq!(
            store.get(RecordTable::TheirDids, "d").unwrap(),
            Some(b"two".to_vec())
        );
        assert!(store.get(RecordTable::Dids, "d").unwrap().is_none());
    }

    #[test]
    fn test_rename_moves_record() {
        let store = WalletStore::in_memory().unwrap();
        store.insert_new(RecordTable::Dids, "old", b"v1").unwrap();
        store.insert_new(RecordTable::Dids, "taken", b"v2").unwrap();

        assert!(!store.rename(RecordTable::Dids, "missing", "new", b"x").unwrap());
        assert!(!store.rename(RecordTable::Dids, "old", "taken", b"x").unwrap());
        assert_eq!(store.get(RecordTable::Dids, "old").unwrap(), Some(b"v1".to_vec()));

        assert!(store.rename(RecordTable::Dids, "old", "new", b"v3").unwrap());
        assert!(store.get(RecordTable::Dids, "old").unwrap().is_none());
        assert_eq!(store.get(RecordTable::Dids, "new").unwrap(), Some(b"v3".to_vec()));
    }

    #[test]
    fn test_list_is_ordered_and_table_scoped() {
        let store = WalletStore::in_memory().unwrap();
        store.insert_new(RecordTable::Dids, "b", b"2").unwrap();
        store.insert_new(RecordTable::Dids, "a", b"1").unwrap();
        store.insert_new(RecordTable::Keys, "k", b"3").unwrap();

        let names: Vec<_> = store
            .list(RecordTable::Dids)
            .unwrap()
            .into_iter()
            .map(|(n, _)| n)
            .collect();
        assert_eq!(names, vec!["a", "b"]);
    }
}
