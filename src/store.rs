//! Key-value storage seam.
//!
//! The canvas persists everything through [`KeyValueStore`], a minimal mirror
//! of the browser's `localStorage` API. The browser host implements it over the
//! page's `Storage` object; tests and native callers use [`MemoryStore`].

#[cfg(test)]
#[path = "store_test.rs"]
mod store_test;

/// Error raised by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// No storage is available (e.g. disabled by the browser).
    #[error("storage unavailable")]
    Unavailable,
    /// The backend rejected the operation; the message comes from the backend.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// String-keyed, string-valued storage.
pub trait KeyValueStore {
    /// All keys, in the backend's enumeration order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be enumerated.
    fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// The value stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read fails.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the write is rejected (quota, privacy mode).
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend rejects the removal.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;

    /// Whether `key` is present.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend read fails.
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

/// In-memory store that enumerates keys in insertion order.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Vec<(String, String)>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `entries`, in order.
    #[must_use]
    pub fn with_entries<K: Into<String>, V: Into<String>>(entries: impl IntoIterator<Item = (K, V)>) -> Self {
        let mut store = Self::new();
        for (key, value) in entries {
            store.insert(key.into(), value.into());
        }
        store
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: String, value: String) {
        if let Some(entry) = self.entries.iter_mut().find(|(k, _)| *k == key) {
            entry.1 = value;
        } else {
            self.entries.push((key, value));
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.entries.iter().map(|(k, _)| k.clone()).collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone()))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.retain(|(k, _)| k != key);
        Ok(())
    }
}

/// [`MemoryStore`] that fails any operation on keys starting with a listed prefix.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub(crate) struct FailingStore {
    pub inner: MemoryStore,
    pub fail_get: Vec<String>,
    pub fail_set: Vec<String>,
    pub fail_remove: Vec<String>,
}

#[cfg(test)]
impl FailingStore {
    pub fn over(entries: &[(&str, &str)]) -> Self {
        Self { inner: MemoryStore::with_entries(entries.iter().copied()), ..Self::default() }
    }

    fn check(prefixes: &[String], key: &str) -> Result<(), StoreError> {
        if prefixes.iter().any(|p| key.starts_with(p.as_str())) {
            return Err(StoreError::Backend(format!("refused {key}")));
        }
        Ok(())
    }
}

#[cfg(test)]
impl KeyValueStore for FailingStore {
    fn keys(&self) -> Result<Vec<String>, StoreError> {
        self.inner.keys()
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Self::check(&self.fail_get, key)?;
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        Self::check(&self.fail_set, key)?;
        self.inner.set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        Self::check(&self.fail_remove, key)?;
        self.inner.remove(key)
    }
}
