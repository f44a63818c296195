//! Browser storage through `web-sys`.

use std::sync::Arc;

use wasm_bindgen::JsValue;

use super::backend::StorageBackend;
use super::resolve::{StorageHost, StoragePreset};
use crate::error::StorageError;

fn js_error(err: JsValue) -> StorageError {
    StorageError::Backend(format!("{err:?}"))
}

/// `window.localStorage` or `window.sessionStorage`.
///
/// JS handles are not `Send`, so the store is looked up on each access.
#[derive(Debug, Clone, Copy)]
pub struct WebStorage {
    preset: StoragePreset,
}

impl WebStorage {
    pub fn new(preset: StoragePreset) -> Self {
        Self { preset }
    }

    fn storage(&self) -> Result<web_sys::Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("no window".to_string()))?;
        let storage = match self.preset {
            StoragePreset::Local => window.local_storage(),
            StoragePreset::Session => window.session_storage(),
        };
        storage
            .map_err(js_error)?
            .ok_or_else(|| StorageError::Unavailable(format!("{} is disabled", self.preset)))
    }
}

impl StorageBackend for WebStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage()?.get_item(key).map_err(js_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage()?.set_item(key, value).map_err(js_error)
    }
}

/// The browser window as a storage host.
#[derive(Debug, Clone)]
pub struct WebStorageHost {
    local: Arc<WebStorage>,
    session: Arc<WebStorage>,
}

impl WebStorageHost {
    /// Returns a host only when running with a `window`.
    pub fn detect() -> Option<Self> {
        web_sys::window().map(|_| Self {
            local: Arc::new(WebStorage::new(StoragePreset::Local)),
            session: Arc::new(WebStorage::new(StoragePreset::Session)),
        })
    }
}

impl StorageHost for WebStorageHost {
    fn local_storage(&self) -> Option<Arc<dyn StorageBackend>> {
        Some(Arc::clone(&self.local) as Arc<dyn StorageBackend>)
    }

    fn session_storage(&self) -> Option<Arc<dyn StorageBackend>> {
        Some(Arc::clone(&self.session) as Arc<dyn StorageBackend>)
    }
}
