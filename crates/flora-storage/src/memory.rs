//! In-memory implementation of [`KeyValueStore`].
//!
//! [`InMemoryStore`] is a first-class backend for tests and for sessions
//! where nothing should outlive the process. It can be given a byte quota
//! to reproduce the "storage full" failures of browser storage.

use std::collections::BTreeMap;

use crate::error::StorageError;
use crate::traits::KeyValueStore;

/// Map-backed implementation of [`KeyValueStore`].
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    entries: BTreeMap<String, String>,
    /// Maximum total bytes of keys plus values, if limited.
    quota: Option<usize>,
}

impl InMemoryStore {
    /// Creates an empty, unlimited store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that rejects writes beyond `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        InMemoryStore {
            entries: BTreeMap::new(),
            quota: Some(quota),
        }
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently counted against the quota.
    pub fn usage_bytes(&self) -> usize {
        self.entries.iter().map(|(k, v)| k.len() + v.len()).sum()
    }
}

impl KeyValueStore for InMemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        if let Some(quota) = self.quota {
            let replaced = self.entries.get(key).map_or(0, |old| key.len() + old.len());
            let needed = self.usage_bytes() - replaced + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.entries.keys().cloned().collect())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::exercise_contract;

    #[test]
    fn satisfies_store_contract() {
        exercise_contract(&mut InMemoryStore::new());
    }

    #[test]
    fn works_through_a_mutable_borrow() {
        fn write_token<S: KeyValueStore>(mut medium: S) {
            medium.set("token", "abc").unwrap();
        }

        let mut store = InMemoryStore::new();
        write_token(&mut store);
        write_token(Box::new(InMemoryStore::new()));
        assert_eq!(store.get("token").unwrap().as_deref(), Some("abc"));
    }

    #[test]
    fn quota_rejects_oversized_writes() {
        let mut store = InMemoryStore::with_quota(16);
        store.set("cart", "[1,2,3]").unwrap(); // 4 + 7 = 11 bytes
        let err = store.set("cart", "[1,2,3,4,5,6,7]").unwrap_err();
        match err {
            StorageError::QuotaExceeded { key, needed, quota } => {
                assert_eq!(key, "cart");
                assert_eq!(needed, 4 + 15);
                assert_eq!(quota, 16);
            }
            other => panic!("expected QuotaExceeded, got {:?}", other),
        }
        // The previous value is untouched.
        assert_eq!(store.get("cart").unwrap().as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn quota_counts_replacement_not_addition() {
        let mut store = InMemoryStore::with_quota(12);
        store.set("cart", "12345678").unwrap(); // exactly 12
        store.set("cart", "87654321").unwrap();
        assert_eq!(store.usage_bytes(), 12);
    }

    #[test]
    fn len_tracks_keys() {
        let mut store = InMemoryStore::new();
        assert!(store.is_empty());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.len(), 2);
    }
}
