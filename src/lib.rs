//! # Stashcan
//!
//! Persistent, globally shared reactive stores for UI components.
//!
//! A store is a named reactive cell that every component using the same key
//! shares. It can be seeded from `localStorage`, `sessionStorage` or any
//! custom backend when a component mounts, and it writes itself back on
//! every change.
//!
//! ```
//! use stashcan::component::{Headless, Scope, StoreEnvironment};
//! use stashcan::storage::{MemoryHost, StoragePreset};
//! use stashcan::store::{create_store, StoreConfig};
//!
//! let use_counter = create_store(
//!     StoreConfig::new(0)
//!         .key("counter")
//!         .storage(StoragePreset::Local),
//! );
//!
//! let host = MemoryHost::new();
//! let app = Headless::new(StoreEnvironment::new().with_host(host.clone()));
//! let mut counter = app.mount(move |cx: &Scope| use_counter.use_store(cx).unwrap());
//!
//! let set_count = counter.output().1.clone();
//! set_count.set(1);
//! assert_eq!(counter.output().0, 1);
//! assert_eq!(host.local().len(), 1);
//! ```
//!
//! ## Layers
//!
//! - [`signal`] - `Signal<T>` cells, `Effect`s and watchers
//! - [`runtime`] - the dependency tracking behind them
//! - [`storage`] - storage backends and the resolver for the named presets
//! - [`store`] - registry, persistence, component binding and the hook factory
//! - [`component`] - the lifecycle capability stores bind to, plus a headless host

pub mod component;
pub mod error;
pub mod runtime;
pub mod signal;
pub mod storage;
pub mod store;

// Re-export main types for convenience
pub use component::{ComponentLifecycle, StoreEnvironment};
pub use error::{StorageError, StoreError, StoreResult};
pub use signal::{create_effect, Effect, Signal, WatchGuard};
pub use storage::{StorageBackend, StorageOption, StoragePreset};
pub use store::{create_store, use_store, Setter, StoreConfig, StoreHook, StoreRegistry};
