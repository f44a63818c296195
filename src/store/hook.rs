use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::binding::{use_signal_value, Setter};
use super::config::StoreConfig;
use super::persist::use_persistence;
use crate::component::ComponentLifecycle;
use crate::error::StoreResult;
use crate::storage::resolve_storage;

/// Bind the rendering component to the store `config` describes.
///
/// Looks up (or creates) the shared cell, resolves storage, hydrates and
/// writes through while mounted, and subscribes the component to changes.
/// Returns the value to render and a setter for the shared cell.
///
/// A config without a key gets a fresh generated key on every call, so
/// such a store is never shared and does not survive a re-render. Use
/// [`create_store`] or an explicit key for anything a component renders
/// more than once.
pub fn use_store<T, C>(cx: &C, config: &StoreConfig<T>) -> StoreResult<(T, Setter<T>)>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    C: ComponentLifecycle,
{
    let key = match &config.key {
        Some(key) => key.clone(),
        None => cx.environment().registry().generate_key(),
    };
    bind(cx, config, key)
}

fn bind<T, C>(cx: &C, config: &StoreConfig<T>, key: String) -> StoreResult<(T, Setter<T>)>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
    C: ComponentLifecycle,
{
    let env = cx.environment();
    let cell = env.registry().get_or_create(&key, config.value.clone())?;
    let backend = resolve_storage(config.storage.as_ref(), env.host());

    use_persistence(cx, &cell, &key, backend);
    let value = use_signal_value(cx, &cell);
    Ok((value, Setter::new(cell)))
}

/// A reusable store hook produced by [`create_store`].
///
/// Holds only the configuration until first used. An unkeyed hook takes a
/// generated key on its first call and keeps it, so every component using
/// the same hook shares one store.
///
/// # Examples
///
/// ```
/// use stashcan::component::{Headless, Scope, StoreEnvironment};
/// use stashcan::store::{create_store, StoreConfig};
///
/// let use_counter = create_store(StoreConfig::new(0).key("counter"));
/// let host = Headless::new(StoreEnvironment::new());
///
/// let mut counter = host.mount(move |cx: &Scope| use_counter.use_store(cx).unwrap());
/// let set_count = counter.output().1.clone();
/// set_count.set(1);
/// assert_eq!(counter.output().0, 1);
/// ```
#[derive(Debug)]
pub struct StoreHook<T> {
    config: StoreConfig<T>,
    generated_key: OnceLock<String>,
}

impl<T> StoreHook<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Run the store pipeline for the rendering component.
    pub fn use_store<C: ComponentLifecycle>(&self, cx: &C) -> StoreResult<(T, Setter<T>)> {
        let key = match &self.config.key {
            Some(key) => key.clone(),
            None => self
                .generated_key
                .get_or_init(|| cx.environment().registry().generate_key())
                .clone(),
        };
        bind(cx, &self.config, key)
    }

    pub fn config(&self) -> &StoreConfig<T> {
        &self.config
    }

    /// The key this hook uses, if it has one yet.
    pub fn key(&self) -> Option<&str> {
        self.config
            .key
            .as_deref()
            .or_else(|| self.generated_key.get().map(String::as_str))
    }
}

/// Package `config` as a hook components call to use the store.
///
/// Nothing is created until the hook is first called from a component.
pub fn create_store<T>(config: StoreConfig<T>) -> StoreHook<T> {
    StoreHook {
        config,
        generated_key: OnceLock::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Headless, Scope, StoreEnvironment};
    use crate::runtime::ReactiveRuntime;
    use std::sync::Arc;

    #[test]
    fn factory_has_no_side_effects() {
        ReactiveRuntime::scope(|| {
            let env = StoreEnvironment::new();
            let hook = create_store(StoreConfig::new(0).key("lazy"));
            assert!(!env.registry().contains("lazy"));

            let _mounted = Headless::new(env.clone()).mount(move |cx: &Scope| hook.use_store(cx).map(|(v, _)| v));
            assert!(env.registry().contains("lazy"));
        });
    }

    #[test]
    fn unkeyed_hook_keeps_its_key() {
        ReactiveRuntime::scope(|| {
            let env = StoreEnvironment::new();
            let hook = Arc::new(create_store(StoreConfig::new(0)));
            assert_eq!(hook.key(), None);

            let mut mounted = Headless::new(env.clone()).mount({
                let hook = Arc::clone(&hook);
                move |cx: &Scope| hook.use_store(cx).unwrap()
            });
            let setter = mounted.output().1.clone();
            setter.set(3);
            setter.set(4);
            assert_eq!(mounted.output().0, 4);

            assert_eq!(hook.key(), Some("store_0"));
            assert_eq!(env.registry().len(), 1);
        });
    }

    #[test]
    fn unkeyed_config_generates_a_key_per_call() {
        ReactiveRuntime::scope(|| {
            let env = StoreEnvironment::new();
            let config = StoreConfig::new(0);
            let _mounted = Headless::new(env.clone()).mount(move |cx: &Scope| {
                let first = use_store(cx, &config).unwrap();
                let second = use_store(cx, &config).unwrap();
                assert!(!first.1.signal().ptr_eq(second.1.signal()));
            });
            assert!(env.registry().contains("store_0"));
            assert!(env.registry().contains("store_1"));
        });
    }

    #[test]
    fn unkeyed_config_rerenders_without_looping() {
        ReactiveRuntime::scope(|| {
            let env = StoreEnvironment::new();
            let config = StoreConfig::new(0);
            let mut mounted = Headless::new(env.clone()).mount(move |cx: &Scope| use_store(cx, &config).unwrap());
            assert_eq!(mounted.output().0, 0);

            mounted.output().1.clone().set(5);
            // The re-render binds a fresh `store_1`, so the write is not seen
            assert_eq!(mounted.output().0, 0);
            assert_eq!(mounted.render_count(), 2);
            assert_eq!(env.registry().len(), 2);

            mounted.output().1.clone().set(6);
            assert_eq!(mounted.output().0, 0);
            assert_eq!(mounted.render_count(), 3);
        });
    }
}
