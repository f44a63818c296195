//! Persistent, globally shared stores.
//!
//! A store is a named [`Signal`](crate::Signal) kept in a [`StoreRegistry`],
//! optionally mirrored into a storage backend, and exposed to components as
//! a value plus a [`Setter`]:
//!
//! - [`create_store`] / [`use_store`] - the entry points components call
//! - [`StoreRegistry`] - one cell per key
//! - [`persist`] - hydration and write-through
//! - [`use_signal_value`] - re-render on change

mod binding;
mod config;
mod hook;
pub mod persist;
mod registry;

pub use binding::{use_signal_value, Setter};
pub use config::StoreConfig;
pub use hook::{create_store, use_store, StoreHook};
pub use persist::Hydration;
pub use registry::StoreRegistry;
