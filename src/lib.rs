//! # Storekit
//!
//! Typed store contexts for Rust.
//!
//! Storekit wraps a small synchronous store with the helpers needed to use it
//! across a scoped tree of consumers:
//!
//! ## Stores
//!
//! - [`store_values!`] - Declares a values struct with a closed key enum and a tagged field enum
//! - [`Store<V>`] - Thread-safe state container with patch merges and subscriptions
//! - [`StoreBuilder`] - Declarative composition of a store with everything below
//!
//! ## Helpers
//!
//! - [`create_setters`] - One generated `set<Prefix><Key>` setter per field
//! - [`StoreContext`] - Provider/consumer pair creating a fresh store per provider scope
//! - [`with_reset`], [`create_persist`], [`create_batch_actions`] - Reset, persistence and batching
//! - [`create_dev_logger`], [`create_selector`] - Development logging and memoized selectors
//!
//! The [`todo`] module shows all of them working together.

pub mod config;
pub mod context;
pub mod dev;
pub mod error;
pub mod extensions;
pub mod setters;
pub mod store;
pub mod todo;

// Re-export main types for convenience
pub use config::{validate_initial_state, Mode, PersistConfig, StoreOptions};
pub use context::{create_store_context, InitialValue, StoreContext};
pub use dev::{create_dev_logger, create_selector, create_selector_with, DevLogger, Selector};
pub use error::{Result, StoreError};
pub use extensions::{
    create_batch_actions, create_persist, with_reset, BatchActions, FileStorage, KeyValueStorage,
    MemoryStorage, Persist, PersistOptions, ResetAction, ResetOptions,
};
pub use setters::{create_setters, setter_name, Setter, Setters};
pub use store::{BundledStore, FieldKey, Patch, Store, StoreBuilder, StoreValues, Subscription};
