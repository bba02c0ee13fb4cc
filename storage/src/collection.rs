//! Typed access to stored documents

use crate::{store::KeyValueStore, Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Whole-collection view over one key
///
/// A missing key reads as an empty collection.
pub struct Collection<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection").field("key", &self.key).finish()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create collection view
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    /// Storage key
    pub fn key(&self) -> &'static str {
        self.key
    }

    /// Load every item
    pub fn load(&self) -> Result<Vec<T>> {
        Ok(self.load_versioned()?.1)
    }

    /// Replace the collection unconditionally
    pub fn save(&self, items: &[T]) -> Result<()> {
        self.store.set(self.key, serde_json::to_value(items)?)?;
        Ok(())
    }

    /// Read, mutate in memory, write back
    ///
    /// The write is conditional on the version that was read; an interleaved
    /// writer surfaces as [`Error::Conflict`]. Nothing is written when `f`
    /// fails.
    pub fn update<R, E>(
        &self,
        f: impl FnOnce(&mut Vec<T>) -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        E: From<Error>,
    {
        let (version, mut items) = self.load_versioned()?;
        let out = f(&mut items)?;
        let value = serde_json::to_value(&items).map_err(Error::from)?;
        self.store.compare_and_set(self.key, version, value)?;
        Ok(out)
    }

    fn load_versioned(&self) -> Result<(Option<u64>, Vec<T>)> {
        match self.store.get(self.key)? {
            Some(entry) => Ok((Some(entry.version), serde_json::from_value(entry.value)?)),
            None => Ok((None, Vec::new())),
        }
    }
}

/// Single-value view over one key
pub struct Document<T> {
    store: Arc<dyn KeyValueStore>,
    key: &'static str,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Document<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            key: self.key,
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Document<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document").field("key", &self.key).finish()
    }
}

impl<T> Document<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Create document view
    pub fn new(store: Arc<dyn KeyValueStore>, key: &'static str) -> Self {
        Self {
            store,
            key,
            _marker: PhantomData,
        }
    }

    /// Load the value, if any
    pub fn load(&self) -> Result<Option<T>> {
        match self.store.get(self.key)? {
            Some(entry) => Ok(Some(serde_json::from_value(entry.value)?)),
            None => Ok(None),
        }
    }

    /// Replace the value unconditionally
    pub fn save(&self, value: &T) -> Result<()> {
        self.store.set(self.key, serde_json::to_value(value)?)?;
        Ok(())
    }

    /// Read, mutate, write back conditionally on the version read
    ///
    /// `f` receives `None` when the key is absent and may create the value.
    pub fn update<R, E>(
        &self,
        f: impl FnOnce(&mut Option<T>) -> std::result::Result<R, E>,
    ) -> std::result::Result<R, E>
    where
        E: From<Error>,
    {
        let (version, mut value) = match self.store.get(self.key)? {
            Some(entry) => (
                Some(entry.version),
                Some(serde_json::from_value(entry.value).map_err(Error::from)?),
            ),
            None => (None, None),
        };

        let out = f(&mut value)?;

        match value {
            Some(value) => {
                let value = serde_json::to_value(&value).map_err(Error::from)?;
                self.store.compare_and_set(self.key, version, value)?;
            }
            None if version.is_some() => self.store.remove(self.key)?,
            None => {}
        }
        Ok(out)
    }
}
