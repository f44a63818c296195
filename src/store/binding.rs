use std::fmt;

use crate::component::{Cleanup, ComponentLifecycle};
use crate::signal::Signal;

/// Subscribe the rendering component to `cell` and return the value to
/// render.
///
/// The subscription is made after commit and dropped on unmount; every
/// change to the cell re-renders the component with the latest value. A
/// write that lands between render and commit is caught up at subscribe
/// time.
pub fn use_signal_value<T, C>(cx: &C, cell: &Signal<T>) -> T
where
    T: Clone + Send + Sync + 'static,
    C: ComponentLifecycle,
{
    let (stored, set_snapshot) = cx.use_state(|| Snapshot::of(cell));
    // A different cell than last render: render its current value.
    let snapshot = if stored.cell == cell.id() {
        stored
    } else {
        Snapshot::of(cell)
    };
    let rendered_version = snapshot.version;

    cx.use_effect(cell.id(), {
        let cell = cell.clone();
        move || {
            let guard = cell.subscribe({
                let cell = cell.clone();
                let set_snapshot = set_snapshot.clone();
                move |value| {
                    set_snapshot(Snapshot {
                        cell: cell.id(),
                        version: cell.version(),
                        value,
                    })
                }
            });
            // Only a write since render marks the component dirty.
            if cell.version() != rendered_version {
                set_snapshot(Snapshot::of(&cell));
            }
            Ok(Some(Box::new(move || drop(guard)) as Cleanup))
        }
    });

    snapshot.value
}

/// What a component last rendered from a cell.
#[derive(Clone)]
struct Snapshot<T> {
    cell: usize,
    version: u64,
    value: T,
}

impl<T: Clone + Send + Sync + 'static> Snapshot<T> {
    fn of(cell: &Signal<T>) -> Self {
        Self {
            cell: cell.id(),
            version: cell.version(),
            value: cell.get_untracked(),
        }
    }
}

/// Writes a store's value straight into its shared cell.
///
/// Every component bound to the cell re-renders through the cell's own
/// change notification.
pub struct Setter<T> {
    cell: Signal<T>,
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter").field("cell", &self.cell.id()).finish()
    }
}

impl<T: Clone + Send + Sync + 'static> Setter<T> {
    pub(crate) fn new(cell: Signal<T>) -> Self {
        Self { cell }
    }

    pub fn set(&self, value: T) {
        self.cell.set(value);
    }

    /// Mutate the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.cell.update(f);
    }

    /// The cell this setter writes to.
    pub fn signal(&self) -> &Signal<T> {
        &self.cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Headless, Scope, StoreEnvironment};
    use crate::runtime::ReactiveRuntime;

    #[test]
    fn external_writes_rerender() {
        ReactiveRuntime::scope(|| {
            let cell = Signal::new(1);
            let mut mounted = Headless::new(StoreEnvironment::new()).mount({
                let cell = cell.clone();
                move |cx: &Scope| use_signal_value(cx, &cell)
            });
            assert_eq!(*mounted.output(), 1);

            cell.set(2);
            assert_eq!(*mounted.output(), 2);
        });
    }

    #[test]
    fn unmount_releases_the_subscription() {
        ReactiveRuntime::scope(|| {
            let cell = Signal::new(1);
            let mounted = Headless::new(StoreEnvironment::new()).mount({
                let cell = cell.clone();
                move |cx: &Scope| use_signal_value(cx, &cell)
            });
            assert_eq!(ReactiveRuntime::current().observer_count(), 1);

            mounted.unmount();
            assert_eq!(ReactiveRuntime::current().observer_count(), 0);
            cell.set(3);
        });
    }

    #[test]
    fn setter_writes_the_cell() {
        ReactiveRuntime::scope(|| {
            let cell = Signal::new(vec![1]);
            let setter = Setter::new(cell.clone());
            setter.update(|v| v.push(2));
            setter.clone().set(vec![9]);
            assert_eq!(cell.get(), vec![9]);
        });
    }

    #[test]
    fn setter_debug_shows_its_cell() {
        ReactiveRuntime::scope(|| {
            let cell = Signal::new(String::from("secret"));
            let rendered = format!("{:?}", Setter::new(cell.clone()));
            assert_eq!(rendered, format!("Setter {{ cell: {} }}", cell.id()));
        });
    }

    #[test]
    fn switching_cells_settles_after_one_render() {
        ReactiveRuntime::scope(|| {
            let first = Signal::new(1);
            let second = Signal::new(20);
            second.set(21);
            let current = Signal::new(first.clone());

            let mut mounted = Headless::new(StoreEnvironment::new()).mount({
                let current = current.clone();
                move |cx: &Scope| use_signal_value(cx, &current.get_untracked())
            });
            assert_eq!(*mounted.output(), 1);

            current.set(second.clone());
            first.set(2);
            assert_eq!(*mounted.output(), 21);
            let renders = mounted.render_count();

            second.set(22);
            assert_eq!(*mounted.output(), 22);
            assert_eq!(mounted.render_count(), renders + 1);
        });
    }
}
