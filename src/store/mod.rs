//! Typed state stores.
//!
//! A store holds a values struct declared with [`store_values!`](crate::store_values),
//! merges [`Patch`]es into it and notifies subscribers after every write.

mod builder;
mod store;
mod values;

pub use builder::{BundledStore, StoreBuilder};
pub use store::{Store, Subscription};
pub use values::{FieldKey, Patch, StoreValues};
