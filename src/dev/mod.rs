//! Development helpers: a mode-gated state logger and memoized selectors.

mod logger;
mod selector;

pub use logger::{create_dev_logger, diff, DevLogger, FieldDiff};
pub use selector::{create_selector, create_selector_with, Selector};
