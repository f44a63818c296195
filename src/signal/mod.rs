//! Fine-grained reactive primitives.
//!
//! This module provides the cell and effect primitives stores are built on:
//! - Signals: Reactive, shared-by-reference cells
//! - Effects: Side effects that rerun when the signals they read change
//! - Watchers: Change listeners with RAII unsubscription

mod effect;
mod signal;

pub use effect::{create_effect, Effect};
pub use signal::{Signal, WatchGuard};
