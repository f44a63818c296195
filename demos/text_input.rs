//! Text input backed by a session-scoped store

use stashcan::component::{Headless, Scope, StoreEnvironment};
use stashcan::storage::{MemoryHost, StorageBackend, StoragePreset};
use stashcan::{create_store, StoreConfig};

fn main() {
    tracing_subscriber::fmt::init();

    println!("=== Session Draft ===\n");

    let browser = MemoryHost::new();
    let app = Headless::new(StoreEnvironment::new().with_host(browser.clone()));
    let use_draft = create_store(
        StoreConfig::new(String::new())
            .key("draft")
            .storage(StoragePreset::Session),
    );

    let mut input = app.mount(move |cx: &Scope| use_draft.use_store(cx).expect("draft store"));
    println!("1. Empty input: {:?}", input.output().0);

    let set_draft = input.output().1.clone();
    set_draft.set("Hello".to_string());
    println!("2. After typing: {:?}", input.output().0);
    println!(
        "   sessionStorage[\"draft\"] = {:?}",
        browser.session().get_item("draft").expect("read storage")
    );

    set_draft.set(String::new());
    println!("3. After clear: {:?}", input.output().0);

    browser.end_session();
    println!("4. Session ended, stored entries: {}", browser.session().len());
}
