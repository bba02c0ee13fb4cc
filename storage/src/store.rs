//! Key-value store trait and in-memory backend

use crate::{Error, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Stored value with its version token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Versioned<T> {
    /// Incremented on every write to the key, starting at 1
    pub version: u64,

    /// Stored value
    pub value: T,
}

/// Persistent key-value store holding one JSON document per key
///
/// Writes replace the whole value. `compare_and_set` is the only conditional
/// write; callers that read-modify-write use it to detect interleaved writers.
pub trait KeyValueStore: Send + Sync {
    /// Read a key
    fn get(&self, key: &str) -> Result<Option<Versioned<Value>>>;

    /// Unconditionally write a key, returning the new version
    fn set(&self, key: &str, value: Value) -> Result<u64>;

    /// Write a key only if its current version equals `expected`
    ///
    /// `expected = None` requires the key to be absent.
    fn compare_and_set(&self, key: &str, expected: Option<u64>, value: Value) -> Result<u64>;

    /// Remove a key (no-op when absent)
    fn remove(&self, key: &str) -> Result<()>;

    /// All stored keys, sorted
    fn keys(&self) -> Result<Vec<String>>;

    /// Check if a key exists
    fn has(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Remove every key
    fn clear(&self) -> Result<()>;
}

/// Versioned key table shared by the backends
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct Table(HashMap<String, Versioned<Value>>);

impl Table {
    pub(crate) fn get(&self, key: &str) -> Option<Versioned<Value>> {
        self.0.get(key).cloned()
    }

    fn version(&self, key: &str) -> Option<u64> {
        self.0.get(key).map(|entry| entry.version)
    }

    pub(crate) fn set(&mut self, key: &str, value: Value) -> u64 {
        let version = self.version(key).unwrap_or(0) + 1;
        self.0.insert(key.to_string(), Versioned { version, value });
        version
    }

    pub(crate) fn compare_and_set(
        &mut self,
        key: &str,
        expected: Option<u64>,
        value: Value,
    ) -> Result<u64> {
        let actual = self.version(key);
        if actual != expected {
            return Err(Error::Conflict {
                key: key.to_string(),
                expected,
                actual,
            });
        }
        Ok(self.set(key, value))
    }

    pub(crate) fn remove(&mut self, key: &str) -> bool {
        self.0.remove(key).is_some()
    }

    pub(crate) fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.0.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub(crate) fn clear(&mut self) {
        self.0.clear();
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    /// Create empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Versioned<Value>>> {
        Ok(self.table.read().get(key))
    }

    fn set(&self, key: &str, value: Value) -> Result<u64> {
        Ok(self.table.write().set(key, value))
    }

    fn compare_and_set(&self, key: &str, expected: Option<u64>, value: Value) -> Result<u64> {
        self.table.write().compare_and_set(key, expected, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.table.write().remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.table.read().keys())
    }

    fn clear(&self) -> Result<()> {
        self.table.write().clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_versions_increment() {
        let store = MemoryStore::new();
        assert_eq!(store.set("k", json!(1)).unwrap(), 1);
        assert_eq!(store.set("k", json!(2)).unwrap(), 2);

        let entry = store.get("k").unwrap().unwrap();
        assert_eq!(entry.version, 2);
        assert_eq!(entry.value, json!(2));
    }

    #[test]
    fn test_compare_and_set_conflict() {
        let store = MemoryStore::new();

        // Absent key requires expected = None
        assert_eq!(store.compare_and_set("k", None, json!("a")).unwrap(), 1);
        assert!(store.compare_and_set("k", None, json!("b")).unwrap_err().is_conflict());

        // Stale version rejected, value untouched
        store.set("k", json!("c")).unwrap();
        let err = store.compare_and_set("k", Some(1), json!("d")).unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict { expected: Some(1), actual: Some(2), .. }
        ));
        assert_eq!(store.get("k").unwrap().unwrap().value, json!("c"));
    }

    #[test]
    fn test_keys_remove_clear() {
        let store = MemoryStore::new();
        store.set("b", json!(null)).unwrap();
        store.set("a", json!(null)).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["a".to_string(), "b".to_string()]);

        store.remove("a").unwrap();
        assert!(!store.has("a").unwrap());
        assert!(store.has("b").unwrap());

        store.clear().unwrap();
        assert!(store.keys().unwrap().is_empty());
    }
}
