use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use crate::error::{StoreError, StoreResult};
use crate::runtime::ReactiveRuntime;
use crate::signal::Signal;

struct RegistryInner {
    cells: Mutex<HashMap<String, Box<dyn Any + Send + Sync>>>,
    next_key: AtomicUsize,
    runtime: Arc<ReactiveRuntime>,
}

/// Mapping from store key to the one shared cell for that key.
///
/// The first caller for a key creates the cell with its initial value;
/// every later caller gets the same cell back. Entries live until the
/// registry is cleared. Cloning yields another handle to the same map.
///
/// A registry belongs to one [`ReactiveRuntime`] and allocates every cell
/// from it. Components using the registry's stores should render under
/// that runtime.
///
/// # Examples
///
/// ```
/// use stashcan::store::StoreRegistry;
///
/// let registry = StoreRegistry::new();
/// let a = registry.get_or_create("counter", 0).unwrap();
/// let b = registry.get_or_create("counter", 99).unwrap();
///
/// assert!(a.ptr_eq(&b));
/// assert_eq!(b.get(), 0);
/// ```
#[derive(Clone)]
pub struct StoreRegistry {
    inner: Arc<RegistryInner>,
}

impl StoreRegistry {
    /// Create an empty, isolated registry in the current runtime.
    pub fn new() -> Self {
        Self::in_runtime(ReactiveRuntime::current())
    }

    /// Create an empty registry whose cells live in `runtime`.
    pub fn in_runtime(runtime: Arc<ReactiveRuntime>) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                cells: Mutex::new(HashMap::new()),
                next_key: AtomicUsize::new(0),
                runtime,
            }),
        }
    }

    /// The process-wide registry.
    ///
    /// Its cells live in [`ReactiveRuntime::global`], whichever runtime is
    /// current when it is first used. Code running inside
    /// [`ReactiveRuntime::scope`] should use its own [`StoreRegistry::new`].
    pub fn global() -> Self {
        static GLOBAL: OnceLock<StoreRegistry> = OnceLock::new();
        GLOBAL
            .get_or_init(|| Self::in_runtime(ReactiveRuntime::global()))
            .clone()
    }

    /// The runtime this registry's cells belong to.
    pub fn runtime(&self) -> &Arc<ReactiveRuntime> {
        &self.inner.runtime
    }

    /// Whether both handles refer to the same registry.
    pub fn ptr_eq(&self, other: &StoreRegistry) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn cells(&self) -> MutexGuard<'_, HashMap<String, Box<dyn Any + Send + Sync>>> {
        self.inner.cells.lock().expect("registry lock poisoned")
    }

    /// Return the cell for `key`, creating it from `initial` if absent.
    ///
    /// `initial` is discarded when the key already exists. Asking for a
    /// different value type than the cell was created with fails with
    /// [`StoreError::TypeMismatch`].
    pub fn get_or_create<T>(&self, key: &str, initial: T) -> StoreResult<Signal<T>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let mut cells = self.cells();
        if let Some(existing) = cells.get(key) {
            return existing
                .downcast_ref::<Signal<T>>()
                .cloned()
                .ok_or_else(|| StoreError::TypeMismatch {
                    key: key.to_string(),
                });
        }

        let cell = ReactiveRuntime::with_runtime(Arc::clone(&self.inner.runtime), || {
            Signal::new(initial)
        });
        cells.insert(key.to_string(), Box::new(cell.clone()));
        tracing::debug!(key, cell = cell.id(), "created store cell");
        Ok(cell)
    }

    /// Look up an existing cell without creating one.
    pub fn get<T>(&self, key: &str) -> Option<StoreResult<Signal<T>>>
    where
        T: Clone + Send + Sync + 'static,
    {
        let cells = self.cells();
        let existing = cells.get(key)?;
        Some(
            existing
                .downcast_ref::<Signal<T>>()
                .cloned()
                .ok_or_else(|| StoreError::TypeMismatch {
                    key: key.to_string(),
                }),
        )
    }

    /// Produce a fresh `store_N` key.
    ///
    /// Every call yields a new key, so a store keyed this way is shared
    /// only with whoever is handed the key.
    pub fn generate_key(&self) -> String {
        let id = self.inner.next_key.fetch_add(1, Ordering::SeqCst);
        format!("store_{id}")
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cells().contains_key(key)
    }

    /// Number of registered cells.
    pub fn len(&self) -> usize {
        self.cells().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells().is_empty()
    }

    /// Drop every cell and restart key generation at `store_0`.
    ///
    /// Components still holding a cell keep it; the next lookup of the
    /// same key creates a new one.
    pub fn clear(&self) {
        self.cells().clear();
        self.inner.next_key.store(0, Ordering::SeqCst);
    }
}

impl Default for StoreRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StoreRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cells = self.cells();
        let mut keys: Vec<&String> = cells.keys().collect();
        keys.sort();
        f.debug_struct("StoreRegistry").field("keys", &keys).finish()
    }
}
