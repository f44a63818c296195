use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::backend::{MemoryStorage, StorageBackend};

/// An environment able to hand out the two well-known browser stores.
pub trait StorageHost: Send + Sync {
    /// Persistent same-origin store, cleared only by explicit action.
    fn local_storage(&self) -> Option<Arc<dyn StorageBackend>>;

    /// Store scoped to the browsing session.
    fn session_storage(&self) -> Option<Arc<dyn StorageBackend>>;
}

/// A host backed by two in-memory stores.
///
/// Stands in for a browser in tests and native builds. Each store is
/// handed out as the same `Arc` every time, as a browser hands out the
/// same `window.localStorage`.
#[derive(Clone)]
pub struct MemoryHost {
    local: MemoryStorage,
    session: MemoryStorage,
    local_backend: Arc<dyn StorageBackend>,
    session_backend: Arc<dyn StorageBackend>,
}

impl MemoryHost {
    pub fn new() -> Self {
        let local = MemoryStorage::new();
        let session = MemoryStorage::new();
        Self {
            local_backend: Arc::new(local.clone()),
            session_backend: Arc::new(session.clone()),
            local,
            session,
        }
    }

    /// Handle to the store served as `localStorage`.
    pub fn local(&self) -> &MemoryStorage {
        &self.local
    }

    /// Handle to the store served as `sessionStorage`.
    pub fn session(&self) -> &MemoryStorage {
        &self.session
    }

    /// Drop the session store, as a browser does when the session ends.
    pub fn end_session(&self) {
        self.session.clear();
    }
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryHost")
            .field("local", &self.local.keys())
            .field("session", &self.session.keys())
            .finish()
    }
}

impl StorageHost for MemoryHost {
    fn local_storage(&self) -> Option<Arc<dyn StorageBackend>> {
        Some(Arc::clone(&self.local_backend))
    }

    fn session_storage(&self) -> Option<Arc<dyn StorageBackend>> {
        Some(Arc::clone(&self.session_backend))
    }
}

/// Where a store persists its value.
#[derive(Clone)]
pub enum StorageOption {
    /// The host's `localStorage`.
    Local,
    /// The host's `sessionStorage`.
    Session,
    /// Any object honoring the storage capability.
    Custom(Arc<dyn StorageBackend>),
}

impl StorageOption {
    /// Wrap a custom backend.
    pub fn custom(backend: impl StorageBackend + 'static) -> Self {
        Self::Custom(Arc::new(backend))
    }
}

impl fmt::Debug for StorageOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("Local"),
            Self::Session => f.write_str("Session"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// The named storage presets, as they appear in configuration text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StoragePreset {
    #[serde(rename = "localStorage")]
    Local,
    #[serde(rename = "sessionStorage")]
    Session,
}

impl StoragePreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "localStorage",
            Self::Session => "sessionStorage",
        }
    }
}

impl fmt::Display for StoragePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for a string that names no storage preset.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown storage preset `{0}` (expected `localStorage` or `sessionStorage`)")]
pub struct UnknownPreset(pub String);

impl FromStr for StoragePreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "localStorage" => Ok(Self::Local),
            "sessionStorage" => Ok(Self::Session),
            other => Err(UnknownPreset(other.to_string())),
        }
    }
}

impl From<StoragePreset> for StorageOption {
    fn from(preset: StoragePreset) -> Self {
        match preset {
            StoragePreset::Local => Self::Local,
            StoragePreset::Session => Self::Session,
        }
    }
}

/// Map a storage option to a concrete backend.
///
/// Without a host nothing persists, whatever the option says. Named presets
/// come from the host; a custom backend is returned unchanged.
pub fn resolve_storage(
    option: Option<&StorageOption>,
    host: Option<&dyn StorageHost>,
) -> Option<Arc<dyn StorageBackend>> {
    let host = host?;
    match option? {
        StorageOption::Local => host.local_storage(),
        StorageOption::Session => host.session_storage(),
        StorageOption::Custom(backend) => Some(Arc::clone(backend)),
    }
}
