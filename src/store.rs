//! Key-value storage for persisted dashboard state.
//!
//! Settings, layout and comments are each stored as one JSON document under
//! a fixed key. The store is injected wherever state is read or written so
//! the same code runs against SQLite in the server and memory in tests.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

/// Storage key for [`crate::settings::UserSettings`].
pub const SETTINGS_KEY: &str = "lcb-settings";
/// Storage key for [`crate::layout::LayoutConfig`].
pub const LAYOUT_KEY: &str = "lcb-dashboard-layout";
/// Storage key for the comment threads.
pub const COMMENTS_KEY: &str = "lcb-dashboard-comments";

/// Errors that can occur when reading or writing the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing storage failed
    Backend(String),
    /// A stored value could not be (de)serialized
    Serialization(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Backend(msg) => write!(f, "Storage error: {}", msg),
            StoreError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// String key-value storage.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StoreError>;
}

/// Reads and deserializes the JSON document under `key`.
pub fn load_json<T, S>(store: &S, key: &str) -> Result<Option<T>, StoreError>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    match store.load(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

/// Serializes `value` and stores it under `key`.
pub fn save_json<T, S>(store: &mut S, key: &str, value: &T) -> Result<(), StoreError>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value)?;
    store.save(key, &raw)
}

/// Loads the document under `key`, falling back to `T::default()` when it is
/// missing, unreadable or corrupt. Failures are logged, not returned.
pub fn load_or_default<T, S>(store: &S, key: &str) -> T
where
    T: DeserializeOwned + Default,
    S: KeyValueStore + ?Sized,
{
    match load_json(store, key) {
        Ok(Some(value)) => value,
        Ok(None) => T::default(),
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to load stored value, using defaults");
            T::default()
        }
    }
}

/// In-memory store, mainly for tests.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        InMemoryStore::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for InMemoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.entries.remove(key);
        Ok(())
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).load(key)
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).save(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Doc {
        name: String,
        count: u32,
    }

    #[test]
    fn in_memory_store_round_trip() {
        let mut store = InMemoryStore::new();
        assert_eq!(store.load("k").unwrap(), None);
        store.save("k", "v").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("v"));
        store.save("k", "w").unwrap();
        assert_eq!(store.load("k").unwrap().as_deref(), Some("w"));
        store.remove("k").unwrap();
        store.remove("k").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn json_helpers_round_trip() {
        let mut store = InMemoryStore::new();
        let doc = Doc {
            name: "layout".into(),
            count: 3,
        };
        save_json(&mut store, "doc", &doc).unwrap();
        assert_eq!(load_json::<Doc, _>(&store, "doc").unwrap(), Some(doc));
    }

    #[test]
    fn corrupt_json_is_an_error_but_defaults_on_load_or_default() {
        let mut store = InMemoryStore::new();
        store.save("doc", "{not json").unwrap();
        assert!(matches!(
            load_json::<Doc, _>(&store, "doc"),
            Err(StoreError::Serialization(_))
        ));
        assert_eq!(load_or_default::<Doc, _>(&store, "doc"), Doc::default());
        assert_eq!(load_or_default::<Doc, _>(&store, "missing"), Doc::default());
    }

    #[test]
    fn boxed_store_delegates() {
        let mut store: Box<dyn KeyValueStore + Send> = Box::new(InMemoryStore::new());
        store.save("a", "1").unwrap();
        assert_eq!(store.load("a").unwrap().as_deref(), Some("1"));
    }
}
