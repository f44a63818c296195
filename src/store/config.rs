use crate::storage::StorageOption;

/// How a store is keyed, seeded and persisted.
///
/// `value` seeds the cell only when the key is first created; later stores
/// sharing the key see the existing value instead.
///
/// # Examples
///
/// ```
/// use stashcan::store::StoreConfig;
/// use stashcan::storage::StoragePreset;
///
/// let config = StoreConfig::new(0)
///     .key("counter")
///     .storage(StoragePreset::Local);
/// assert_eq!(config.key_ref(), Some("counter"));
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig<T> {
    pub(crate) key: Option<String>,
    pub(crate) value: T,
    pub(crate) storage: Option<StorageOption>,
}

impl<T> StoreConfig<T> {
    /// An unkeyed, unpersisted store seeded with `value`.
    pub fn new(value: T) -> Self {
        Self {
            key: None,
            value,
            storage: None,
        }
    }

    /// Share the store (and its stored value) under `key`.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Persist the store through `storage`.
    pub fn storage(mut self, storage: impl Into<StorageOption>) -> Self {
        self.storage = Some(storage.into());
        self
    }

    pub fn key_ref(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn initial_value(&self) -> &T {
        &self.value
    }

    pub fn storage_option(&self) -> Option<&StorageOption> {
        self.storage.as_ref()
    }
}
