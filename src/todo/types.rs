use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub text: String,
    pub completed: bool,
}

impl TodoItem {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            completed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    pub fn matches(self, item: &TodoItem) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Active => !item.completed,
            TodoFilter::Completed => item.completed,
        }
    }
}

crate::store_values! {
    /// Fields of a todo list store.
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    pub struct TodoValues {
        key TodoKey;
        field TodoField;
        items: Vec<TodoItem> => Items,
        filter: TodoFilter => Filter,
        is_loading: bool => IsLoading,
    }
}

impl Default for TodoValues {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            filter: TodoFilter::All,
            is_loading: false,
        }
    }
}

impl TodoValues {
    /// Items passing the current filter.
    pub fn visible_items(&self) -> Vec<TodoItem> {
        self.items
            .iter()
            .filter(|item| self.filter.matches(item))
            .cloned()
            .collect()
    }
}
