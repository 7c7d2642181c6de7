//! The [`KeyValueStore`] trait defining the persistence-medium contract.
//!
//! A medium is a flat map from string keys to string values, scoped by its
//! backend (a namespace for [`SqliteStore`](crate::SqliteStore), the whole
//! map for [`InMemoryStore`](crate::InMemoryStore)). Callers serialize their
//! own state; [`load_json`](KeyValueStore::load_json) and
//! [`save_json`](KeyValueStore::save_json) cover the common JSON case.
//!
//! All backends implement this trait, so stores in `flora-shop` are generic
//! over the medium and can be swapped without changing their logic.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// The storage contract for string values under string keys.
///
/// The trait is synchronous: writes are expected to be fast local calls.
pub trait KeyValueStore {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key is not an error.
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;

    /// Lists all keys in ascending order.
    fn keys(&self) -> Result<Vec<String>, StorageError>;

    /// Removes every key.
    fn clear(&mut self) -> Result<(), StorageError>;

    /// Reads and deserializes a JSON value stored under `key`.
    ///
    /// Returns `Ok(None)` when the key is absent and
    /// [`StorageError::Serialization`] when the stored text does not parse.
    fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError>
    where
        Self: Sized,
    {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` as JSON and stores it under `key`.
    fn save_json<T: Serialize + ?Sized>(&mut self, key: &str, value: &T) -> Result<(), StorageError>
    where
        Self: Sized,
    {
        let raw = serde_json::to_string(value)?;
        self.set(key, &raw)
    }
}

// Lending a medium: a store can hold `&mut S` while the caller keeps
// ownership and hands the same medium to the next store afterwards.

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        (**self).remove(key)
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        (**self).keys()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        (**self).clear()
    }
}

/// Behaviour every backend must share, run against each implementation.
#[cfg(test)]
pub(crate) fn exercise_contract<S: KeyValueStore>(store: &mut S) {
    assert_eq!(store.get("cart").unwrap(), None);
    assert!(store.keys().unwrap().is_empty());

    store.set("cart", "[]").unwrap();
    store.set("adminToken", "t-1").unwrap();
    assert_eq!(store.get("cart").unwrap().as_deref(), Some("[]"));

    // Overwrite replaces the value.
    store.set("cart", r#"[{"id":"f1"}]"#).unwrap();
    assert_eq!(store.get("cart").unwrap().as_deref(), Some(r#"[{"id":"f1"}]"#));
    assert_eq!(store.keys().unwrap(), vec!["adminToken", "cart"]);

    // Removing twice is fine.
    store.remove("adminToken").unwrap();
    store.remove("adminToken").unwrap();
    assert_eq!(store.get("adminToken").unwrap(), None);

    // JSON helpers.
    store.save_json("favorites", &vec!["f1", "f2"]).unwrap();
    let favorites: Option<Vec<String>> = store.load_json("favorites").unwrap();
    assert_eq!(favorites, Some(vec!["f1".to_string(), "f2".to_string()]));
    let missing: Option<Vec<String>> = store.load_json("nope").unwrap();
    assert_eq!(missing, None);

    store.set("broken", "{not json").unwrap();
    let broken: Result<Option<Vec<String>>, _> = store.load_json("broken");
    assert!(matches!(broken, Err(StorageError::Serialization(_))));

    store.clear().unwrap();
    assert!(store.keys().unwrap().is_empty());
}
