use crate::store::{Patch, Store, StoreValues};
use parking_lot::Mutex;
use tracing::debug;

type QueuedAction<V> = Box<dyn FnOnce(&V) -> Patch<V> + Send>;

struct BatchQueue<V: StoreValues> {
    actions: Vec<QueuedAction<V>>,
    is_batching: bool,
}

/// Deferred updates for one store, applied together on commit.
///
/// Lifecycle is `start` → `add_action`* → `commit` or `clear`. There is no
/// reentrancy guard: starting a second batch before committing simply keeps
/// appending to the first.
pub struct BatchActions<V: StoreValues> {
    store: Store<V>,
    queue: Mutex<BatchQueue<V>>,
}

impl<V: StoreValues> BatchActions<V> {
    /// Enter batching mode.
    pub fn start(&self) {
        self.queue.lock().is_batching = true;
    }

    /// Queue an action while batching, or apply it right away otherwise.
    ///
    /// The action receives the state it is applied to: the live state when
    /// applied immediately, the state folded so far when committed.
    pub fn add_action<F>(&self, action: F)
    where
        F: FnOnce(&V) -> Patch<V> + Send + 'static,
    {
        {
            let mut queue = self.queue.lock();
            if queue.is_batching {
                queue.actions.push(Box::new(action));
                return;
            }
        }
        let state = self.store.get_state();
        self.store.set_state(action(&state));
    }

    /// Fold every queued action over the current state and apply the result
    /// as one update.
    ///
    /// Returns `false` and does nothing when no batch was started.
    pub fn commit(&self) -> bool {
        let actions = {
            let mut queue = self.queue.lock();
            if !queue.is_batching {
                return false;
            }
            queue.is_batching = false;
            std::mem::take(&mut queue.actions)
        };

        let count = actions.len();
        let mut state = self.store.get_state();
        let mut merged = Patch::new();
        for action in actions {
            let patch = action(&state);
            patch.apply_to(&mut state);
            merged.merge(patch);
        }
        debug!(actions = count, fields = merged.len(), "committing batch");
        self.store.set_state(merged);
        true
    }

    /// Drop queued actions and leave batching mode.
    pub fn clear(&self) {
        let mut queue = self.queue.lock();
        queue.actions.clear();
        queue.is_batching = false;
    }

    pub fn is_batching(&self) -> bool {
        self.queue.lock().is_batching
    }

    /// Number of queued actions.
    pub fn len(&self) -> usize {
        self.queue.lock().actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Attach a batch queue to `store`.
pub fn create_batch_actions<V: StoreValues>(store: &Store<V>) -> BatchActions<V> {
    BatchActions {
        store: store.clone(),
        queue: Mutex::new(BatchQueue {
            actions: Vec::new(),
            is_batching: false,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    crate::store_values! {
        #[derive(Debug, PartialEq)]
        struct Cart {
            key CartKey;
            field CartField;
            items: Vec<String> => Items,
            total: u32 => Total,
        }
    }

    fn empty_cart() -> Cart {
        Cart {
            items: Vec::new(),
            total: 0,
        }
    }

    fn add_item(name: &'static str, price: u32) -> impl FnOnce(&Cart) -> Patch<Cart> + Send {
        move |cart| {
            let mut items = cart.items.clone();
            items.push(name.to_string());
            Patch::new()
                .with(CartField::Items(items))
                .with(CartField::Total(cart.total + price))
        }
    }

    #[test]
    fn add_action_without_batch_applies_immediately() {
        let store = Store::new(empty_cart());
        let batch = create_batch_actions(&store);

        batch.add_action(add_item("tea", 3));
        assert_eq!(store.get_state().total, 3);
        assert!(batch.is_empty());
    }

    #[test]
    fn immediate_action_may_write_to_its_store() {
        let store = Store::new(empty_cart());
        let batch = create_batch_actions(&store);

        batch.add_action({
            let store = store.clone();
            move |cart| {
                store.set_state(Patch::single(CartField::Items(vec!["bread".to_string()])));
                Patch::single(CartField::Total(cart.total + 4))
            }
        });

        assert_eq!(
            store.get_state(),
            Cart {
                items: vec!["bread".to_string()],
                total: 4,
            }
        );
    }

    #[test]
    fn commit_applies_queue_in_order_once() {
        let store = Store::new(empty_cart());
        let batch = create_batch_actions(&store);
        let notifications = Arc::new(AtomicUsize::new(0));
        let _subscription = store.subscribe({
            let notifications = notifications.clone();
            move |_, _| {
                notifications.fetch_add(1, Ordering::SeqCst);
            }
        });

        batch.start();
        batch.add_action(add_item("tea", 3));
        batch.add_action(add_item("milk", 2));
        batch.add_action(|_| Patch::single(CartField::Total(100)));
        assert_eq!(batch.len(), 3);
        assert_eq!(store.get_state(), empty_cart());

        assert!(batch.commit());
        assert_eq!(
            store.get_state(),
            Cart {
                items: vec!["tea".to_string(), "milk".to_string()],
                total: 100,
            }
        );
        assert_eq!(notifications.load(Ordering::SeqCst), 1);
        assert!(!batch.is_batching());
    }

    #[test]
    fn commit_without_start_is_a_no_op() {
        let store = Store::new(empty_cart());
        let batch = create_batch_actions(&store);

        assert!(!batch.commit());
        assert_eq!(store.get_state(), empty_cart());
    }

    #[test]
    fn clear_discards_queue() {
        let store = Store::new(empty_cart());
        let batch = create_batch_actions(&store);

        batch.start();
        batch.add_action(add_item("tea", 3));
        batch.clear();

        assert!(!batch.commit());
        assert_eq!(store.get_state(), empty_cart());
    }
}
