use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

type Observer = Arc<dyn Fn() + Send + Sync>;

/// Reactive graph state for one runtime.
struct ReactiveContext {
    current_observer: Option<usize>,
    // Map from signal ID to the observers that read it on their last run
    dependencies: HashMap<usize, BTreeSet<usize>>,
    // Map from observer ID to the signals it read on its last run
    observer_deps: HashMap<usize, BTreeSet<usize>>,
    observers: HashMap<usize, Observer>,
}

impl ReactiveContext {
    fn new() -> Self {
        Self {
            current_observer: None,
            dependencies: HashMap::new(),
            observer_deps: HashMap::new(),
            observers: HashMap::new(),
        }
    }

    fn clear(&mut self) {
        self.current_observer = None;
        self.dependencies.clear();
        self.observer_deps.clear();
        self.observers.clear();
    }

    fn untrack(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for signal_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&signal_id) {
                    deps.remove(&observer_id);
                    if deps.is_empty() {
                        self.dependencies.remove(&signal_id);
                    }
                }
            }
        }
    }
}

/// Shared runtime state, held weakly by guards and effects.
pub struct RuntimeInner {
    context: Mutex<ReactiveContext>,
}

impl RuntimeInner {
    fn new() -> Self {
        Self {
            context: Mutex::new(ReactiveContext::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ReactiveContext> {
        self.context.lock().expect("reactive context lock poisoned")
    }

    /// Forget an observer and every dependency edge it owns.
    pub fn remove_observer(&self, observer_id: usize) {
        let mut ctx = self.lock();
        ctx.observers.remove(&observer_id);
        ctx.untrack(observer_id);
    }
}

/// Reactive runtime for signals, effects and watchers.
///
/// Supports both a global runtime (default) and scoped runtimes for
/// isolation. The runtime records which observers read which signals and
/// reruns those observers synchronously when a signal is written.
///
/// # Examples
///
/// ```
/// use stashcan::runtime::ReactiveRuntime;
/// use stashcan::Signal;
///
/// ReactiveRuntime::scope(|| {
///     let signal = Signal::new(0);
///     assert_eq!(signal.get(), 0);
/// });
/// // Runtime and all its state is dropped here
/// ```
pub struct ReactiveRuntime {
    next_id: AtomicUsize,
    inner: Arc<RuntimeInner>,
}

// Thread-local stack for scoped runtimes
thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<ReactiveRuntime>>> = const { RefCell::new(Vec::new()) };
}

impl ReactiveRuntime {
    /// Create a new isolated runtime.
    pub fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            next_id: AtomicUsize::new(0),
            inner: Arc::new(RuntimeInner::new()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// The runtime and all its state is dropped when the function returns.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// Get or create the global runtime (fallback).
    pub fn global() -> Arc<Self> {
        use std::sync::OnceLock;
        static RUNTIME: OnceLock<Arc<ReactiveRuntime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// Get the current reactive runtime (scoped or global fallback).
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .cloned()
                .unwrap_or_else(Self::global)
        })
    }

    /// Run a function with a specific runtime as the current context.
    ///
    /// # Examples
    ///
    /// ```
    /// use stashcan::runtime::ReactiveRuntime;
    /// use stashcan::Signal;
    ///
    /// let runtime = ReactiveRuntime::new();
    /// ReactiveRuntime::with_runtime(runtime, || {
    ///     let signal = Signal::new(42);
    ///     assert_eq!(signal.get(), 42);
    /// });
    /// ```
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().push(runtime);
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        RUNTIME_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// Clear all observers, dependencies, and reset the ID counter.
    ///
    /// Useful for resetting between tests.
    pub fn clear(&self) {
        self.inner.lock().clear();
        self.next_id.store(0, Ordering::SeqCst);
    }

    /// Weak handle used by guards to deregister on drop.
    pub(crate) fn downgrade(&self) -> Weak<RuntimeInner> {
        Arc::downgrade(&self.inner)
    }

    /// Generate the next unique ID for a reactive primitive.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of live observers (effects and watchers).
    pub fn observer_count(&self) -> usize {
        self.inner.lock().observers.len()
    }

    /// Track a read of a signal by the current observer.
    pub fn track_read(&self, signal_id: usize) {
        let mut ctx = self.inner.lock();
        if let Some(current_observer) = ctx.current_observer {
            ctx.dependencies
                .entry(signal_id)
                .or_default()
                .insert(current_observer);
            ctx.observer_deps
                .entry(current_observer)
                .or_default()
                .insert(signal_id);
        }
    }

    /// Rerun every observer that read the given signal.
    ///
    /// Observers run in creation order.
    pub fn notify_observers(&self, signal_id: usize) {
        let observers: Vec<usize> = {
            let ctx = self.inner.lock();
            match ctx.dependencies.get(&signal_id) {
                Some(obs) => obs.iter().copied().collect(),
                None => return,
            }
        };

        for observer_id in observers {
            self.run_observer(observer_id);
        }
    }

    /// Register an observer function under the given ID.
    pub fn create_observer<F>(&self, observer_id: usize, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        let mut ctx = self.inner.lock();
        ctx.untrack(observer_id);
        ctx.observers.insert(observer_id, Arc::new(f));
    }

    /// Run a registered observer, re-tracking what it reads.
    pub fn run_observer(&self, observer_id: usize) {
        let observer = {
            let mut ctx = self.inner.lock();
            let observer = ctx.observers.get(&observer_id).cloned();
            if observer.is_some() {
                ctx.untrack(observer_id);
            }
            observer
        };

        if let Some(observer) = observer {
            self.with_observer(observer_id, || observer());
        }
    }

    /// Run a function with a specific observer as the current context.
    pub fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = self.inner.lock().current_observer.replace(observer_id);
        let result = f();
        self.inner.lock().current_observer = prev;
        result
    }

    /// Run a function with no observer, so its reads are not tracked.
    pub fn untracked<F, R>(&self, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let prev = self.inner.lock().current_observer.take();
        let result = f();
        self.inner.lock().current_observer = prev;
        result
    }
}
