//! Demonstration of a todo store provided to a scope

use storekit::todo::{provide_todos, use_todos, TodoField, TodoFilter, TodoItem};
use storekit::Patch;

fn render_list() -> storekit::Result<()> {
    let todos = use_todos()?;
    let state = todos.state();
    if state.is_loading {
        println!("   Loading...");
        return Ok(());
    }
    for todo in todos.visible_items() {
        let status = if todo.completed { "✓" } else { " " };
        println!("   [{}] {}", status, todo.text);
    }
    Ok(())
}

fn main() -> storekit::Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== Store Context Example: Todo App ===\n");

    provide_todos(
        Some(Patch::single(TodoField::Filter(TodoFilter::All))),
        || -> storekit::Result<()> {
            let todos = use_todos()?;

            println!("1. Setting up subscriber");
            let _subscription = todos.store().subscribe(|next, _prev| {
                let completed = next.items.iter().filter(|t| t.completed).count();
                println!(
                    "   [Store Update] Total: {}, Active: {}, Completed: {}",
                    next.items.len(),
                    next.items.len() - completed,
                    completed
                );
            });

            println!("\n2. Adding todos");
            todos.add_todo(TodoItem::new("1", "Learn Rust"));
            todos.add_todo(TodoItem::new("2", "Build a store"));
            todos.add_todo(TodoItem::new("3", "Write documentation"));

            println!("\n3. Current todos:");
            render_list()?;

            println!("\n4. Completing first todo");
            todos.toggle_todo("1");

            println!("\n5. Filtering to show only active todos");
            todos.set_filter(TodoFilter::Active)?;
            render_list()?;

            println!("\n6. Removing second todo");
            todos.remove_todo("2");
            render_list()?;

            println!("\n7. Generated setters:");
            for name in todos.setters().names() {
                println!("   {}", name);
            }
            Ok(())
        },
    )?;

    println!("\n8. Outside the provider:");
    match use_todos() {
        Ok(_) => println!("   unexpectedly found a store"),
        Err(e) => println!("   {}", e),
    }

    println!("\n✓ Example complete!");
    Ok(())
}
