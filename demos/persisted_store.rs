//! Demonstration of the declarative todo store persisting to disk

use std::sync::Arc;
use storekit::todo::{todo_store, TodoFilter, TodoItem};
use storekit::{FileStorage, KeyValueStorage, Mode};

fn main() -> storekit::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let dir = std::env::temp_dir().join("storekit-demo");
    let storage: Arc<dyn KeyValueStorage> = Arc::new(FileStorage::open(&dir)?);
    println!("=== Persisted Store Example ({}) ===\n", dir.display());

    let todos = todo_store(storage.clone(), Mode::Development)?;
    println!("1. Loaded {} todos", todos.state().items.len());

    println!("\n2. Batching three updates");
    let batch = todos.bundle().batch();
    batch.start();
    todos.add_todo(TodoItem::new("a", "Buy milk"));
    todos.add_todo(TodoItem::new("b", "Walk the dog"));
    todos.set_filter(TodoFilter::Active);
    println!("   queued: {}", batch.len());
    batch.commit();

    println!("\n3. Active todos: {}", todos.active_todos().len());
    todos.save()?;

    println!("\n4. Reopening from storage");
    let reopened = todo_store(storage.clone(), Mode::Production)?;
    println!("   items: {}", reopened.state().items.len());
    println!("   filter: {:?}", reopened.state().filter);

    println!("\n5. Resetting and clearing storage");
    reopened.bundle().reset().reset();
    if let Some(persist) = reopened.bundle().persist() {
        persist.clear()?;
    }
    println!("   items after reset: {}", reopened.state().items.len());

    println!("\n✓ Example complete!");
    Ok(())
}
