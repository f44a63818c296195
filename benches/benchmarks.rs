use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use std::hint::black_box;

use serde::{Deserialize, Serialize};
use stashcan::component::{Headless, Scope, StoreEnvironment};
use stashcan::storage::{MemoryHost, MemoryStorage, StoragePreset};
use stashcan::store::persist::{hydrate, write_through};
use stashcan::{create_store, Signal, StorageBackend, StoreConfig, StoreRegistry};

#[derive(Clone, Serialize, Deserialize)]
struct Settings {
    theme: String,
    font_size: u32,
    recent: Vec<String>,
}

fn settings(recent: usize) -> Settings {
    Settings {
        theme: "dark".to_string(),
        font_size: 14,
        recent: (0..recent).map(|i| format!("file_{i}.rs")).collect(),
    }
}

fn registry_lookup_benchmark(c: &mut Criterion) {
    let registry = StoreRegistry::new();
    for i in 0..1_000 {
        registry
            .get_or_create(&format!("store_{i}"), i)
            .expect("fresh key");
    }

    c.bench_function("registry_lookup", |b| {
        b.iter(|| {
            black_box(registry.get_or_create(black_box("store_500"), 0).expect("same type"));
        });
    });
}

fn write_through_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("write_through");

    for size in [0, 10, 100].iter() {
        let storage = MemoryStorage::new();
        let cell = Signal::new(settings(*size));

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                write_through(&cell, "settings", &storage).expect("no quota");
            });
        });
    }

    group.finish();
}

fn hydrate_benchmark(c: &mut Criterion) {
    let storage = MemoryStorage::new();
    storage
        .set_item("settings", &serde_json::to_string(&settings(100)).expect("encode"))
        .expect("no quota");
    let cell = Signal::new(settings(0));

    c.bench_function("hydrate", |b| {
        b.iter(|| {
            black_box(hydrate(&cell, "settings", &storage).expect("readable"));
        });
    });
}

fn persisted_set_benchmark(c: &mut Criterion) {
    let host = MemoryHost::new();
    let app = Headless::new(StoreEnvironment::new().with_host(host));
    let use_counter = create_store(StoreConfig::new(0).key("counter").storage(StoragePreset::Local));
    let mut mounted = app.mount(move |cx: &Scope| use_counter.use_store(cx).expect("binds"));
    let setter = mounted.output().1.clone();

    c.bench_function("persisted_set_and_rerender", |b| {
        let mut i = 0;
        b.iter(|| {
            setter.set(black_box(i));
            black_box(mounted.output().0);
            i += 1;
        });
    });
}

criterion_group!(
    benches,
    registry_lookup_benchmark,
    write_through_benchmark,
    hydrate_benchmark,
    persisted_set_benchmark
);
criterion_main!(benches);
