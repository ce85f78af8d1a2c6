//! Optional add-ons attached to a store: reset, persistence and batching.

mod batch;
mod persist;
mod reset;
mod storage;

pub use batch::{create_batch_actions, BatchActions};
pub use persist::{create_persist, Persist, PersistOptions};
pub use reset::{with_reset, ResetAction, ResetOptions};
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};

pub(crate) use persist::patch_from_object;
