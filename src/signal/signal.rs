use crate::runtime::{ReactiveRuntime, RuntimeInner};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, Weak};

/// A reactive cell that holds a value and notifies subscribers when changed.
///
/// Cloning a signal clones the handle, not the value: every clone reads and
/// writes the same cell.
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    version: Arc<AtomicU64>,
    id: usize,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            version: Arc::clone(&self.version),
            id: self.id,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("id", &self.id)
            .field("version", &self.version.load(Ordering::SeqCst))
            .field("value", &*self.value.read().expect("signal lock poisoned"))
            .finish()
    }
}

impl<T> Signal<T> {
    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Number of writes so far; bumps on every `set` and `update`.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::SeqCst)
    }

    /// Whether two handles point at the same cell.
    pub fn ptr_eq(&self, other: &Signal<T>) -> bool {
        Arc::ptr_eq(&self.value, &other.value)
    }
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(initial: T) -> Self {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        Self {
            value: Arc::new(RwLock::new(initial)),
            version: Arc::new(AtomicU64::new(0)),
            id,
        }
    }

    /// Get the current value, recording the read for the running observer.
    pub fn get(&self) -> T {
        ReactiveRuntime::current().track_read(self.id);
        self.value.read().expect("signal lock poisoned").clone()
    }

    /// Get the current value without subscribing the running observer.
    pub fn get_untracked(&self) -> T {
        self.value.read().expect("signal lock poisoned").clone()
    }

    /// Set a new value and notify observers.
    pub fn set(&self, new_value: T) {
        *self.value.write().expect("signal lock poisoned") = new_value;
        self.version.fetch_add(1, Ordering::SeqCst);
        ReactiveRuntime::current().notify_observers(self.id);
    }

    /// Update the value in place and notify observers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut value = self.value.write().expect("signal lock poisoned");
        f(&mut *value);
        drop(value); // Release the write lock before notifying
        self.version.fetch_add(1, Ordering::SeqCst);
        ReactiveRuntime::current().notify_observers(self.id);
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        ReactiveRuntime::current().track_read(self.id);
        let value = self.value.read().expect("signal lock poisoned");
        f(&*value)
    }

    /// Subscribe to future writes.
    ///
    /// The callback runs with the new value after every write, but not for
    /// the current value. Dropping the returned guard unsubscribes.
    pub fn subscribe<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let observer_id = runtime.next_id();
        let source = self.clone();

        runtime.create_observer(observer_id, move || {
            callback(source.get());
        });
        runtime.with_observer(observer_id, || runtime.track_read(self.id));

        WatchGuard {
            observer_id,
            runtime: runtime.downgrade(),
        }
    }

    /// Watch this signal for changes.
    ///
    /// Like [`subscribe`](Self::subscribe), but the callback also runs
    /// immediately with the current value.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let callback = Arc::new(callback);
        let guard = self.subscribe({
            let callback = Arc::clone(&callback);
            move |value| callback(value)
        });
        callback(self.get_untracked());
        guard
    }
}

/// RAII guard for signal watchers.
#[must_use = "dropping the guard unsubscribes the watcher"]
pub struct WatchGuard {
    observer_id: usize,
    runtime: Weak<RuntimeInner>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.observer_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn clones_share_the_cell() {
        ReactiveRuntime::scope(|| {
            let a = Signal::new(1);
            let b = a.clone();
            b.set(7);
            assert_eq!(a.get(), 7);
            assert!(a.ptr_eq(&b));
            assert!(!a.ptr_eq(&Signal::new(7)));
        });
    }

    #[test]
    fn watch_runs_immediately_then_on_change() {
        ReactiveRuntime::scope(|| {
            let signal = Signal::new(String::from("a"));
            let seen = Arc::new(Mutex::new(Vec::new()));
            let seen_clone = Arc::clone(&seen);

            let guard = signal.watch(move |v| seen_clone.lock().unwrap().push(v));
            signal.set("b".to_string());
            signal.update(|s| s.push('c'));
            drop(guard);
            signal.set("ignored".to_string());

            assert_eq!(*seen.lock().unwrap(), vec!["a", "b", "bc"]);
        });
    }

    #[test]
    fn subscribe_skips_current_value() {
        ReactiveRuntime::scope(|| {
            let signal = Signal::new(1);
            let seen = Arc::new(Mutex::new(Vec::new()));
            let seen_clone = Arc::clone(&seen);

            let _guard = signal.subscribe(move |v| seen_clone.lock().unwrap().push(v));
            assert!(seen.lock().unwrap().is_empty());

            signal.set(2);
            signal.set(2);
            assert_eq!(*seen.lock().unwrap(), vec![2, 2]);
            assert_eq!(signal.version(), 2);
        });
    }

    #[test]
    fn dropped_guard_leaves_no_observer() {
        ReactiveRuntime::scope(|| {
            let signal = Signal::new(0);
            let guard = signal.watch(|_| {});
            assert_eq!(ReactiveRuntime::current().observer_count(), 1);
            drop(guard);
            assert_eq!(ReactiveRuntime::current().observer_count(), 0);
        });
    }
}
