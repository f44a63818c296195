//! The component lifecycle capability stores bind to.
//!
//! A rendering framework implements [`ComponentLifecycle`] for its render
//! context. Stores only need three things from it: local state that forces
//! a re-render, commit-time effects with cleanup, and somewhere to send
//! errors. [`Headless`] is a small framework-free implementation used by
//! tests and native tools.

mod headless;

pub use headless::{Headless, Mounted, Scope};

use std::fmt;
use std::sync::{Arc, Mutex};

use crate::error::StoreError;
use crate::storage::StorageHost;
use crate::store::StoreRegistry;

/// Work to run when an effect is replaced or its component unmounts.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// Writes a component's local state and schedules a re-render.
pub type StateSetter<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Hooks a rendering framework provides to a component while it renders.
///
/// Hooks are identified by call order, so a component must call them in the
/// same order on every render.
pub trait ComponentLifecycle {
    /// The injected store context for this component tree.
    fn environment(&self) -> &StoreEnvironment;

    /// Local state seeded by `init` on first render.
    ///
    /// Calling the setter re-renders the component with the new value.
    fn use_state<T, F>(&self, init: F) -> (T, StateSetter<T>)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T;

    /// Run `effect` after the component commits, and again after any
    /// commit where `deps` changed. The cleanup it returns runs before the
    /// next run and on unmount. Errors go to the error boundary.
    fn use_effect<D, F>(&self, deps: D, effect: F)
    where
        D: PartialEq + Send + Sync + 'static,
        F: FnOnce() -> Result<Option<Cleanup>, StoreError> + Send + 'static;

    /// Where errors raised outside render end up.
    fn error_boundary(&self) -> ErrorBoundary;
}

/// Collects errors raised by effects for the host to surface.
#[derive(Clone, Default)]
pub struct ErrorBoundary {
    errors: Arc<Mutex<Vec<StoreError>>>,
}

impl ErrorBoundary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand an error to the boundary.
    pub fn raise(&self, error: StoreError) {
        tracing::error!(%error, "store error reached the error boundary");
        self.errors.lock().expect("lock poisoned").push(error);
    }

    /// Take every error raised since the last call.
    pub fn take(&self) -> Vec<StoreError> {
        std::mem::take(&mut *self.errors.lock().expect("lock poisoned"))
    }

    pub fn is_empty(&self) -> bool {
        self.errors.lock().expect("lock poisoned").is_empty()
    }
}

impl fmt::Debug for ErrorBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let errors = self.errors.lock().expect("lock poisoned");
        f.debug_struct("ErrorBoundary")
            .field("errors", &*errors)
            .finish()
    }
}

/// The context stores read from the component tree: which registry cells
/// live in, and which storage host (if any) backs persistence.
#[derive(Clone)]
pub struct StoreEnvironment {
    registry: StoreRegistry,
    host: Option<Arc<dyn StorageHost>>,
}

impl StoreEnvironment {
    /// An environment with its own registry and no storage host.
    pub fn new() -> Self {
        Self {
            registry: StoreRegistry::new(),
            host: None,
        }
    }

    /// The process-wide registry and whatever storage the platform offers.
    ///
    /// wasm32 builds with the `web` feature use the browser window when
    /// there is one; everything else gets no host, so persistence is a
    /// no-op.
    pub fn detect() -> Self {
        #[cfg(all(feature = "web", target_arch = "wasm32"))]
        let host = crate::storage::WebStorageHost::detect()
            .map(|host| Arc::new(host) as Arc<dyn StorageHost>);
        #[cfg(not(all(feature = "web", target_arch = "wasm32")))]
        let host = None;

        Self {
            registry: StoreRegistry::global(),
            host,
        }
    }

    /// Replace the registry.
    pub fn with_registry(mut self, registry: StoreRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Use `host` for the named storage presets.
    pub fn with_host(mut self, host: impl StorageHost + 'static) -> Self {
        self.host = Some(Arc::new(host));
        self
    }

    /// Disable persistence entirely.
    pub fn without_host(mut self) -> Self {
        self.host = None;
        self
    }

    pub fn registry(&self) -> &StoreRegistry {
        &self.registry
    }

    pub fn host(&self) -> Option<&dyn StorageHost> {
        self.host.as_deref()
    }
}

impl Default for StoreEnvironment {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Debug for StoreEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreEnvironment")
            .field("stores", &self.registry.len())
            .field("has_host", &self.host.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(not(target_arch = "wasm32"))]
    fn detect_has_no_host_off_the_web() {
        let env = StoreEnvironment::detect();
        assert!(env.host().is_none());
        assert!(StoreEnvironment::default().host().is_none());
        assert!(env.registry().ptr_eq(&StoreRegistry::global()));
    }

    #[test]
    fn builders_swap_registry_and_host() {
        let registry = StoreRegistry::new();
        let env = StoreEnvironment::new()
            .with_registry(registry.clone())
            .with_host(crate::storage::MemoryHost::new());
        assert!(env.host().is_some());
        assert!(env.registry().ptr_eq(&registry));
        assert!(env.without_host().host().is_none());
    }
}
