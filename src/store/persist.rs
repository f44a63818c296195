use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::component::{Cleanup, ComponentLifecycle};
use crate::error::{StoreError, StoreResult};
use crate::signal::{Effect, Signal};
use crate::storage::StorageBackend;

/// What hydration did with the stored value.
#[derive(Debug)]
pub enum Hydration {
    /// The stored value was decoded and assigned to the cell.
    Restored,
    /// Nothing was stored under the key.
    Missing,
    /// The stored text did not decode; the cell kept its value.
    Malformed(serde_json::Error),
}

/// Load the value stored under `key` into `cell`.
///
/// A value that fails to decode leaves the cell as it was and is reported
/// as [`Hydration::Malformed`] rather than as an error. Backend failures
/// are errors.
pub fn hydrate<T>(
    cell: &Signal<T>,
    key: &str,
    backend: &dyn StorageBackend,
) -> StoreResult<Hydration>
where
    T: DeserializeOwned + Clone + Send + Sync + 'static,
{
    let stored = backend.get_item(key).map_err(|source| StoreError::Storage {
        key: key.to_string(),
        source,
    })?;
    let Some(raw) = stored else {
        return Ok(Hydration::Missing);
    };

    match serde_json::from_str::<T>(&raw) {
        Ok(value) => {
            tracing::debug!(key, "hydrated store from storage");
            cell.set(value);
            Ok(Hydration::Restored)
        }
        Err(err) => {
            tracing::warn!(key, error = %err, "ignoring malformed stored value");
            Ok(Hydration::Malformed(err))
        }
    }
}

/// Serialize the cell's current value and store it under `key`.
///
/// The read is tracked, so calling this inside an [`Effect`] reruns it on
/// every change to `cell`.
pub fn write_through<T>(cell: &Signal<T>, key: &str, backend: &dyn StorageBackend) -> StoreResult<()>
where
    T: Serialize + Clone + Send + Sync + 'static,
{
    let raw = cell
        .with(|value| serde_json::to_string(value))
        .map_err(|source| StoreError::Serialize {
            key: key.to_string(),
            source,
        })?;
    tracing::trace!(key, bytes = raw.len(), "writing store through to storage");
    backend.set_item(key, &raw).map_err(|source| StoreError::Storage {
        key: key.to_string(),
        source,
    })
}

/// Bind `cell` to `backend` for the lifetime of the component.
///
/// After the component commits, the stored value (if any) is loaded into
/// the cell, then an effect writes the cell back on every change until the
/// component unmounts. Without a backend this does nothing.
pub fn use_persistence<T, C>(
    cx: &C,
    cell: &Signal<T>,
    key: &str,
    backend: Option<Arc<dyn StorageBackend>>,
) where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    C: ComponentLifecycle,
{
    // Backends are told apart by address; hosts hand out one `Arc` per store.
    let backend_id = backend
        .as_ref()
        .map(|backend| Arc::as_ptr(backend) as *const () as usize);
    let deps = (cell.id(), key.to_string(), backend_id);

    cx.use_effect(deps.clone(), {
        let cell = cell.clone();
        let key = key.to_string();
        let backend = backend.clone();
        move || {
            if let Some(backend) = backend {
                hydrate(&cell, &key, &*backend)?;
            }
            Ok(None)
        }
    });

    let boundary = cx.error_boundary();
    cx.use_effect(deps, {
        let cell = cell.clone();
        let key = key.to_string();
        move || {
            let Some(backend) = backend else {
                return Ok(None);
            };
            let effect = Effect::new(move || {
                if let Err(error) = write_through(&cell, &key, &*backend) {
                    boundary.raise(error);
                }
            });
            Ok(Some(Box::new(move || drop(effect)) as Cleanup))
        }
    });
}
