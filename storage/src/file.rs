//! File-backed store
//!
//! The whole table is one JSON document. Every mutation rewrites it through a
//! temporary file and a rename, so a crash leaves either the old or the new
//! document on disk.

use crate::{
    store::{KeyValueStore, Table, Versioned},
    Result,
};
use parking_lot::RwLock;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Store persisted as a single JSON file
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    table: RwLock<Table>,
}

impl JsonFileStore {
    /// Open or create the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let table = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                Table::default()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
            Table::default()
        };

        tracing::info!("Opened household store at {:?} ({} keys)", path, table.keys().len());

        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    /// Backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, table: &Table) -> Result<()> {
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(table)?)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Versioned<Value>>> {
        Ok(self.table.read().get(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<u64> {
        let mut table = self.table.write();
        let mut next = table.clone();
        let version = next.set(key, value);
        self.flush(&next)?;
        *table = next;
        Ok(version)
    }

    fn compare_and_set(&self, key: &str, expected: Option<u64>, value: Value) -> Result<u64> {
        let mut table = self.table.write();
        let mut next = table.clone();
        let version = next.compare_and_set(key, expected, value)?;
        self.flush(&next)?;
        *table = next;
        Ok(version)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut table = self.table.write();
        let mut next = table.clone();
        if next.remove(key) {
            self.flush(&next)?;
            *table = next;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.table.read().keys())
    }

    fn clear(&self) -> Result<()> {
        let mut table = self.table.write();
        let next = Table::default();
        self.flush(&next)?;
        *table = next;
        Ok(())
    }
}
