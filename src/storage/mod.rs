//! Storage backends and the resolver that picks one for a store.
//!
//! A store persists through a [`StorageBackend`]. Configuration names either
//! one of the host's two well-known stores or a custom backend, and
//! [`resolve_storage`] turns that into a concrete backend or nothing.

mod backend;
mod resolve;
#[cfg(all(feature = "web", target_arch = "wasm32"))]
mod web;

pub use backend::{MemoryStorage, StorageBackend};
pub use resolve::{
    resolve_storage, MemoryHost, StorageHost, StorageOption, StoragePreset, UnknownPreset,
};
#[cfg(all(feature = "web", target_arch = "wasm32"))]
pub use web::{WebStorage, WebStorageHost};
