use crate::store::{Store, StoreValues};
use tracing::debug;

/// Fields a reset must leave alone.
#[derive(Debug, Clone)]
pub struct ResetOptions<K> {
    pub blacklist: Vec<K>,
}

impl<K> Default for ResetOptions<K> {
    fn default() -> Self {
        Self {
            blacklist: Vec::new(),
        }
    }
}

impl<K> ResetOptions<K> {
    pub fn blacklist(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            blacklist: keys.into_iter().collect(),
        }
    }
}

/// Restores a store to the state it was created with.
pub struct ResetAction<V: StoreValues> {
    store: Store<V>,
    initial: V,
    blacklist: Vec<V::Key>,
}

impl<V: StoreValues> ResetAction<V> {
    /// Put every non-blacklisted field back to its initial value.
    ///
    /// Blacklisted fields keep their current value. The result replaces the
    /// whole state rather than being merged.
    pub fn reset(&self) {
        let current = self.store.get_state();
        let mut next = self.initial.clone();
        for &key in &self.blacklist {
            next.set_field(current.field(key));
        }
        debug!(kept = self.blacklist.len(), "resetting store");
        self.store.replace_state(next);
    }

    pub fn initial(&self) -> &V {
        &self.initial
    }
}

impl<V: StoreValues> Clone for ResetAction<V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            initial: self.initial.clone(),
            blacklist: self.blacklist.clone(),
        }
    }
}

/// Attach a reset action to `store`.
pub fn with_reset<V: StoreValues>(
    store: &Store<V>,
    initial: V,
    options: ResetOptions<V::Key>,
) -> ResetAction<V> {
    ResetAction {
        store: store.clone(),
        initial,
        blacklist: options.blacklist,
    }
}
