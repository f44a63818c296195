use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::error::StorageError;

/// String key/value persistence capability.
///
/// Mirrors the browser `Storage` interface: values are plain strings and a
/// missing key reads as `None`.
pub trait StorageBackend: Send + Sync {
    /// Read the value stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

impl<B: StorageBackend + ?Sized> StorageBackend for Arc<B> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

/// In-memory, HashMap-based storage backend.
///
/// Cloning yields another handle to the same map, so a test can keep one
/// handle for inspection while a store writes through another. An optional
/// quota caps the total bytes of keys plus values, like a browser store.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    items: Arc<RwLock<HashMap<String, String>>>,
    quota: Option<usize>,
}

impl MemoryStorage {
    /// Create a new empty storage without a quota.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new empty storage that rejects writes beyond `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            items: Arc::default(),
            quota: Some(quota),
        }
    }

    /// Remove the value stored under `key`, returning it.
    pub fn remove_item(&self, key: &str) -> Option<String> {
        self.items.write().expect("lock poisoned").remove(key)
    }

    /// Remove every entry.
    pub fn clear(&self) {
        self.items.write().expect("lock poisoned").clear();
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.items.read().expect("lock poisoned").len()
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.items.read().expect("lock poisoned").is_empty()
    }

    /// Sorted list of stored keys.
    pub fn keys(&self) -> Vec<String> {
        let items = self.items.read().expect("lock poisoned");
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl StorageBackend for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.read().expect("lock poisoned").get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = self.items.write().expect("lock poisoned");
        if let Some(quota) = self.quota {
            let others: usize = items
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded { needed, quota });
            }
        }
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_reads_none() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get_item("nope").unwrap(), None);
    }

    #[test]
    fn clones_share_items() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        other.set_item("k", "\"v\"").unwrap();
        assert_eq!(storage.get_item("k").unwrap().as_deref(), Some("\"v\""));
        assert_eq!(storage.keys(), vec!["k"]);

        assert_eq!(storage.remove_item("k").as_deref(), Some("\"v\""));
        assert!(other.is_empty());
    }

    #[test]
    fn quota_rejects_oversized_writes() {
        let storage = MemoryStorage::with_quota(8);
        storage.set_item("k", "1234").unwrap();
        // Replacing an entry only counts the new value
        storage.set_item("k", "1234567").unwrap();

        let err = storage.set_item("other", "12").unwrap_err();
        assert_eq!(err, StorageError::QuotaExceeded { needed: 15, quota: 8 });
        assert_eq!(storage.len(), 1);
    }
}
