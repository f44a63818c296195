use std::any::Any;
use std::cell::{Cell, RefCell};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{Cleanup, ComponentLifecycle, ErrorBoundary, StateSetter, StoreEnvironment};
use crate::error::StoreError;

// Re-renders allowed per flush before a state loop is assumed.
const MAX_RERENDERS: usize = 64;

type EffectFn = Box<dyn FnOnce() -> Result<Option<Cleanup>, StoreError> + Send>;

enum Slot {
    State(Box<dyn Any + Send + Sync>),
    Effect {
        deps: Option<Box<dyn Any + Send + Sync>>,
        cleanup: Option<Cleanup>,
    },
}

struct Instance {
    slots: Mutex<Vec<Slot>>,
    dirty: AtomicBool,
    mounted: AtomicBool,
    boundary: ErrorBoundary,
}

impl Instance {
    fn slots(&self) -> MutexGuard<'_, Vec<Slot>> {
        self.slots.lock().expect("hook slots lock poisoned")
    }
}

struct PendingEffect {
    index: usize,
    deps: Box<dyn Any + Send + Sync>,
    run: EffectFn,
}

/// A framework-free component host.
///
/// Renders synchronously, runs effects right after each commit and
/// re-renders on [`Mounted::flush`] when local state changed in between.
#[derive(Debug, Clone)]
pub struct Headless {
    env: StoreEnvironment,
}

impl Headless {
    pub fn new(env: StoreEnvironment) -> Self {
        Self { env }
    }

    pub fn environment(&self) -> &StoreEnvironment {
        &self.env
    }

    /// Render `render` once, commit it, and settle any state it set.
    pub fn mount<V, F>(&self, render: F) -> Mounted<V>
    where
        F: Fn(&Scope) -> V + 'static,
    {
        let instance = Arc::new(Instance {
            slots: Mutex::new(Vec::new()),
            dirty: AtomicBool::new(false),
            mounted: AtomicBool::new(true),
            boundary: ErrorBoundary::new(),
        });

        let render: Box<dyn Fn(&Scope) -> V> = Box::new(render);
        let output = render_pass(&self.env, &instance, &*render);

        let mut mounted = Mounted {
            env: self.env.clone(),
            instance,
            render,
            output,
            renders: 1,
        };
        mounted.flush();
        mounted
    }
}

/// The render-time context handed to a headless component.
pub struct Scope {
    env: StoreEnvironment,
    instance: Arc<Instance>,
    cursor: Cell<usize>,
    pending: RefCell<Vec<PendingEffect>>,
}

impl Scope {
    fn next_index(&self) -> usize {
        let index = self.cursor.get();
        self.cursor.set(index + 1);
        index
    }
}

impl ComponentLifecycle for Scope {
    fn environment(&self) -> &StoreEnvironment {
        &self.env
    }

    fn use_state<T, F>(&self, init: F) -> (T, StateSetter<T>)
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        let index = self.next_index();
        let is_new = self.instance.slots().len() == index;
        if is_new {
            let cell: Arc<Mutex<T>> = Arc::new(Mutex::new(init()));
            self.instance.slots().push(Slot::State(Box::new(cell)));
        }

        let cell = match &self.instance.slots()[index] {
            Slot::State(any) => any.downcast_ref::<Arc<Mutex<T>>>().cloned(),
            Slot::Effect { .. } => None,
        }
        .unwrap_or_else(|| panic!("hook #{index} changed kind or type between renders"));

        let value = cell.lock().expect("state lock poisoned").clone();
        let instance = Arc::downgrade(&self.instance);
        let setter: StateSetter<T> = Arc::new(move |next: T| {
            *cell.lock().expect("state lock poisoned") = next;
            if let Some(instance) = instance.upgrade() {
                if instance.mounted.load(Ordering::SeqCst) {
                    instance.dirty.store(true, Ordering::SeqCst);
                }
            }
        });
        (value, setter)
    }

    fn use_effect<D, F>(&self, deps: D, effect: F)
    where
        D: PartialEq + Send + Sync + 'static,
        F: FnOnce() -> Result<Option<Cleanup>, StoreError> + Send + 'static,
    {
        let index = self.next_index();
        let mut slots = self.instance.slots();
        if slots.len() == index {
            slots.push(Slot::Effect {
                deps: None,
                cleanup: None,
            });
        }

        let unchanged = match &slots[index] {
            Slot::Effect { deps: previous, .. } => previous
                .as_ref()
                .and_then(|previous| previous.downcast_ref::<D>())
                .is_some_and(|previous| *previous == deps),
            Slot::State(_) => panic!("hook #{index} changed kind between renders"),
        };
        drop(slots);

        if !unchanged {
            self.pending.borrow_mut().push(PendingEffect {
                index,
                deps: Box::new(deps),
                run: Box::new(effect),
            });
        }
    }

    fn error_boundary(&self) -> ErrorBoundary {
        self.instance.boundary.clone()
    }
}

fn render_pass<V>(env: &StoreEnvironment, instance: &Arc<Instance>, render: &dyn Fn(&Scope) -> V) -> V {
    let scope = Scope {
        env: env.clone(),
        instance: Arc::clone(instance),
        cursor: Cell::new(0),
        pending: RefCell::new(Vec::new()),
    };
    let output = render(&scope);
    commit(instance, scope.pending.into_inner());
    output
}

fn commit(instance: &Instance, pending: Vec<PendingEffect>) {
    // Every stale cleanup runs before any new effect body.
    let stale: Vec<Cleanup> = {
        let mut slots = instance.slots();
        pending
            .iter()
            .filter_map(|effect| match slots.get_mut(effect.index) {
                Some(Slot::Effect { cleanup, .. }) => cleanup.take(),
                _ => None,
            })
            .collect()
    };
    for cleanup in stale {
        cleanup();
    }

    for effect in pending {
        let cleanup = match (effect.run)() {
            Ok(cleanup) => cleanup,
            Err(error) => {
                instance.boundary.raise(error);
                None
            }
        };

        if let Some(slot) = instance.slots().get_mut(effect.index) {
            *slot = Slot::Effect {
                deps: Some(effect.deps),
                cleanup,
            };
        }
    }
}

/// A mounted headless component.
///
/// Unmounts (running every effect cleanup) when dropped.
pub struct Mounted<V> {
    env: StoreEnvironment,
    instance: Arc<Instance>,
    render: Box<dyn Fn(&Scope) -> V>,
    output: V,
    renders: usize,
}

impl<V> Mounted<V> {
    /// Re-render until local state stops changing.
    ///
    /// # Panics
    ///
    /// Panics if the component keeps setting state on every render.
    pub fn flush(&mut self) {
        let mut rerenders = 0;
        while self.instance.dirty.swap(false, Ordering::SeqCst) {
            rerenders += 1;
            assert!(
                rerenders <= MAX_RERENDERS,
                "component re-rendered {MAX_RERENDERS} times without settling"
            );
            self.output = render_pass(&self.env, &self.instance, &*self.render);
            self.renders += 1;
        }
    }

    /// The latest render output, after flushing pending re-renders.
    pub fn output(&mut self) -> &V {
        self.flush();
        &self.output
    }

    /// How many times the component has rendered.
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Errors raised by this component's effects since the last call.
    pub fn take_errors(&self) -> Vec<StoreError> {
        self.instance.boundary.take()
    }

    /// Remove the component, running every effect cleanup.
    pub fn unmount(self) {
        // Drop does the work
    }

    fn teardown(&mut self) {
        if !self.instance.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        let cleanups: Vec<Cleanup> = self
            .instance
            .slots()
            .iter_mut()
            .filter_map(|slot| match slot {
                Slot::Effect { cleanup, .. } => cleanup.take(),
                Slot::State(_) => None,
            })
            .collect();
        for cleanup in cleanups {
            cleanup();
        }
    }
}

impl<V> Drop for Mounted<V> {
    fn drop(&mut self) {
        self.teardown();
    }
}
