//! Scoped store contexts.
//!
//! A context binds a store factory to a provider scope, so code running inside
//! the scope can reach the store without threading it through every call.

mod context;

pub use context::{create_store_context, InitialValue, StoreContext};
