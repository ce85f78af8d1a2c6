//! Example todo stores.
//!
//! [`TodoStore`] is wired through a [`StoreContext`](crate::StoreContext) with
//! generated setters and hand-written actions; [`Todos`] is the same list built
//! declaratively with [`StoreBuilder`](crate::StoreBuilder).

mod context;
mod declarative;
mod types;

pub use context::{provide_todos, todo_context, use_todos, TodoStore, DISPLAY_NAME, SETTER_PREFIX};
pub use declarative::{todo_store, Todos, STORAGE_KEY};
pub use types::{TodoField, TodoFilter, TodoItem, TodoKey, TodoValues};
