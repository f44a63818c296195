/// Failures reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The backend exists but refused access (security restriction, disabled storage).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// Writing would exceed the backend's capacity.
    #[error("storage quota exceeded ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded { needed: usize, quota: usize },

    /// Any other backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The key is already bound to a cell holding a different value type.
    #[error("store `{key}` already holds a value of a different type")]
    TypeMismatch { key: String },

    /// Reading from or writing to the storage backend failed.
    #[error("storage access for `{key}` failed: {source}")]
    Storage {
        key: String,
        #[source]
        source: StorageError,
    },

    /// The value could not be encoded for storage.
    #[error("failed to serialize `{key}`: {source}")]
    Serialize {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
