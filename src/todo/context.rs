use crate::context::{create_store_context, InitialValue, StoreContext};
use crate::error::Result;
use crate::setters::{create_setters, Setters};
use crate::store::{Patch, Store};
use crate::todo::types::{TodoField, TodoFilter, TodoItem, TodoValues};
use std::sync::OnceLock;

pub const DISPLAY_NAME: &str = "Todo";
pub const SETTER_PREFIX: &str = DISPLAY_NAME;

/// A todo store: generated setters plus hand-written list actions.
#[derive(Clone)]
pub struct TodoStore {
    store: Store<TodoValues>,
    setters: Setters<TodoValues>,
}

impl TodoStore {
    pub fn new(init: InitialValue<TodoValues>) -> Self {
        let store = Store::new(init.apply(&TodoValues::default()));
        let setters = create_setters(&store, SETTER_PREFIX);
        Self { store, setters }
    }

    pub fn store(&self) -> &Store<TodoValues> {
        &self.store
    }

    pub fn state(&self) -> TodoValues {
        self.store.get_state()
    }

    /// `setTodoItems`, `setTodoFilter` and `setTodoIsLoading`.
    pub fn setters(&self) -> &Setters<TodoValues> {
        &self.setters
    }

    pub fn set_items(&self, items: Vec<TodoItem>) -> Result<()> {
        self.setters.call("setTodoItems", TodoField::Items(items))
    }

    pub fn set_filter(&self, filter: TodoFilter) -> Result<()> {
        self.setters.call("setTodoFilter", TodoField::Filter(filter))
    }

    pub fn set_is_loading(&self, is_loading: bool) -> Result<()> {
        self.setters
            .call("setTodoIsLoading", TodoField::IsLoading(is_loading))
    }

    pub fn add_todo(&self, todo: TodoItem) {
        let mut items = self.store.read(|state| state.items.clone());
        items.push(todo);
        self.store.set_state(Patch::single(TodoField::Items(items)));
    }

    pub fn toggle_todo(&self, id: &str) {
        let items = self.store.read(|state| {
            state
                .items
                .iter()
                .map(|item| {
                    if item.id == id {
                        TodoItem {
                            completed: !item.completed,
                            ..item.clone()
                        }
                    } else {
                        item.clone()
                    }
                })
                .collect()
        });
        self.store.set_state(Patch::single(TodoField::Items(items)));
    }

    pub fn remove_todo(&self, id: &str) {
        let items = self.store.read(|state| {
            state
                .items
                .iter()
                .filter(|item| item.id != id)
                .cloned()
                .collect()
        });
        self.store.set_state(Patch::single(TodoField::Items(items)));
    }

    pub fn visible_items(&self) -> Vec<TodoItem> {
        self.store.read(TodoValues::visible_items)
    }
}

/// The shared todo context.
pub fn todo_context() -> &'static StoreContext<TodoValues, TodoStore> {
    static CONTEXT: OnceLock<StoreContext<TodoValues, TodoStore>> = OnceLock::new();
    CONTEXT.get_or_init(|| create_store_context(DISPLAY_NAME, TodoStore::new))
}

/// Provide a fresh todo store to everything `f` runs.
pub fn provide_todos<F, R>(initial_value: Option<Patch<TodoValues>>, f: F) -> R
where
    F: FnOnce() -> R,
{
    todo_context().provide(initial_value, f)
}

/// The todo store of the enclosing provider.
pub fn use_todos() -> Result<TodoStore> {
    todo_context().use_context()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[test]
    fn add_toggle_remove() {
        provide_todos(None, || {
            let todos = use_todos().unwrap();
            assert_eq!(todos.state(), TodoValues::default());

            todos.add_todo(TodoItem::new("1", "x"));
            assert_eq!(todos.state().items, vec![TodoItem::new("1", "x")]);

            todos.toggle_todo("1");
            assert!(todos.state().items[0].completed);

            todos.remove_todo("1");
            assert!(todos.state().items.is_empty());
        });
    }

    #[test]
    fn initial_value_overrides_filter() {
        provide_todos(
            Some(Patch::single(TodoField::Filter(TodoFilter::Active))),
            || {
                let todos = use_todos().unwrap();
                assert_eq!(todos.state().filter, TodoFilter::Active);
                assert!(!todos.state().is_loading);
            },
        );
    }

    #[test]
    fn generated_setters_are_named_after_the_store() {
        let todos = todo_context().create(None);
        assert_eq!(
            todos.setters().names().collect::<Vec<_>>(),
            vec!["setTodoFilter", "setTodoIsLoading", "setTodoItems"]
        );

        todos.set_is_loading(true).unwrap();
        todos.set_filter(TodoFilter::Completed).unwrap();
        assert!(todos.state().is_loading);
        assert_eq!(todos.state().filter, TodoFilter::Completed);
    }

    #[test]
    fn visible_items_follow_filter() {
        let todos = todo_context().create(None);
        todos
            .set_items(vec![TodoItem::new("1", "a"), TodoItem::new("2", "b")])
            .unwrap();
        todos.toggle_todo("2");

        todos.set_filter(TodoFilter::Active).unwrap();
        assert_eq!(todos.visible_items(), vec![TodoItem::new("1", "a")]);

        todos.set_filter(TodoFilter::Completed).unwrap();
        assert_eq!(todos.visible_items().len(), 1);
        assert_eq!(todos.visible_items()[0].id, "2");
    }

    #[test]
    fn use_todos_outside_provider_fails() {
        assert!(matches!(use_todos(), Err(StoreError::MissingProvider(_))));
    }
}
