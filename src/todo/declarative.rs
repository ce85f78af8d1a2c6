use crate::config::Mode;
use crate::dev::{create_selector, Selector};
use crate::error::Result;
use crate::extensions::{KeyValueStorage, PersistOptions};
use crate::store::{BundledStore, Patch, StoreBuilder};
use crate::todo::types::{TodoField, TodoFilter, TodoItem, TodoKey, TodoValues};
use std::sync::Arc;

/// Storage key of the persisted todo list.
pub const STORAGE_KEY: &str = "todo-storage";

/// A todo list built declaratively: persisted items and filter, named
/// actions and a memoized active-items selector.
#[derive(Clone)]
pub struct Todos {
    bundle: BundledStore<TodoValues>,
    active: Selector<TodoValues, Vec<TodoItem>>,
}

/// Build the declarative todo store on top of `storage`.
///
/// A snapshot already stored under [`STORAGE_KEY`] is loaded on creation.
pub fn todo_store(storage: Arc<dyn KeyValueStorage>, mode: Mode) -> Result<Todos> {
    let bundle = StoreBuilder::new("Todo", TodoValues::default())
        .mode(mode)
        .persist(
            storage,
            STORAGE_KEY,
            PersistOptions::whitelist([TodoKey::Items, TodoKey::Filter]),
        )
        .build()?;
    let active = create_selector(|state: &TodoValues| {
        state
            .items
            .iter()
            .filter(|item| !item.completed)
            .cloned()
            .collect::<Vec<_>>()
    });
    Ok(Todos { bundle, active })
}

impl Todos {
    pub fn bundle(&self) -> &BundledStore<TodoValues> {
        &self.bundle
    }

    pub fn state(&self) -> TodoValues {
        self.bundle.state()
    }

    pub fn set_filter(&self, filter: TodoFilter) {
        self.apply("set_filter", move |_| Patch::single(TodoField::Filter(filter)));
    }

    pub fn add_todo(&self, todo: TodoItem) {
        self.apply("add_todo", move |state| {
            let mut items = state.items.clone();
            items.push(todo);
            Patch::single(TodoField::Items(items))
        });
    }

    pub fn toggle_todo(&self, id: &str) {
        let id = id.to_string();
        self.apply("toggle_todo", move |state| {
            let items = state
                .items
                .iter()
                .map(|item| TodoItem {
                    completed: item.completed != (item.id == id),
                    ..item.clone()
                })
                .collect();
            Patch::single(TodoField::Items(items))
        });
    }

    /// Replace the list with what `load` returns, flagging `is_loading` while
    /// it runs. On failure only the loading flag is cleared.
    pub fn refresh_with<F>(&self, load: F) -> Result<()>
    where
        F: FnOnce() -> Result<Vec<TodoItem>>,
    {
        self.bundle
            .store()
            .set_state(Patch::single(TodoField::IsLoading(true)));
        let loaded = load();
        let mut patch = Patch::single(TodoField::IsLoading(false));
        let result = match loaded {
            Ok(items) => {
                patch.push(TodoField::Items(items));
                Ok(())
            }
            Err(e) => Err(e),
        };
        self.bundle.store().set_state(patch);
        result
    }

    /// Incomplete items; the same `Arc` while they do not change.
    pub fn active_todos(&self) -> Arc<Vec<TodoItem>> {
        self.bundle.store().read(|state| self.active.select(state))
    }

    /// Write items and filter to storage.
    pub fn save(&self) -> Result<()> {
        match self.bundle.persist() {
            Some(persist) => persist.save(),
            None => Ok(()),
        }
    }

    fn apply<F>(&self, action: &str, f: F)
    where
        F: FnOnce(&TodoValues) -> Patch<TodoValues> + Send + 'static,
    {
        self.bundle.log_action(action, None);
        self.bundle.batch().add_action(f);
    }
}
