//! Counter application: a persisted store shared by two components

use stashcan::component::{Headless, Scope, StoreEnvironment};
use stashcan::storage::{MemoryHost, StorageBackend, StoragePreset};
use stashcan::{create_store, Setter, StoreConfig};

#[derive(Clone)]
struct CounterView {
    label: String,
    increment: Setter<i32>,
    count: i32,
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    println!("=== Persisted Counter ===\n");

    // A fake browser with a value left over from a previous visit
    let browser = MemoryHost::new();
    browser
        .local()
        .set_item("counter", "41")
        .expect("seed storage");

    let env = StoreEnvironment::new().with_host(browser.clone());
    let app = Headless::new(env);

    println!("1. Defining the store");
    let use_counter = std::sync::Arc::new(create_store(
        StoreConfig::new(0)
            .key("counter")
            .storage(StoragePreset::Local),
    ));

    println!("\n2. Mounting a toolbar and a status bar");
    let counter_view = |name: &'static str| {
        let use_counter = use_counter.clone();
        move |cx: &Scope| {
            let (count, set_count) = use_counter.use_store(cx).expect("counter store");
            CounterView {
                label: format!("[{name}] count = {count}"),
                increment: set_count,
                count,
            }
        }
    };
    let mut toolbar = app.mount(counter_view("toolbar"));
    let mut status = app.mount(counter_view("status"));

    println!("   {}", toolbar.output().label);
    println!("   {}", status.output().label);

    println!("\n3. Clicking + in the toolbar");
    let view = toolbar.output().clone();
    view.increment.set(view.count + 1);
    println!("   {}", toolbar.output().label);
    println!("   {}", status.output().label);

    println!("\n4. What the browser stored");
    println!(
        "   localStorage[\"counter\"] = {:?}",
        browser.local().get_item("counter").expect("read storage")
    );

    println!("\n5. Unmounting the status bar");
    status.unmount();
    let view = toolbar.output().clone();
    view.increment.update(|n| *n += 1);
    println!("   {}", toolbar.output().label);

    println!("\n✓ Counter application complete!");
}
