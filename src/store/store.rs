use crate::store::values::{Patch, StoreValues};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::trace;

type Listener<V> = Arc<dyn Fn(&V, &V) + Send + Sync>;
type Listeners<V> = RwLock<Vec<(usize, Listener<V>)>>;

/// A thread-safe store for a set of named fields.
///
/// Every write is synchronous: the state is replaced under the write lock and
/// subscribers are called afterwards on the writer's thread with
/// `(next, previous)`.
pub struct Store<V> {
    state: Arc<RwLock<V>>,
    subscribers: Arc<Listeners<V>>,
    next_id: Arc<AtomicUsize>,
}

impl<V: StoreValues> Store<V> {
    /// Create a new store with the given initial state.
    pub fn new(initial: V) -> Self {
        Self {
            state: Arc::new(RwLock::new(initial)),
            subscribers: Arc::new(RwLock::new(Vec::new())),
            next_id: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get a clone of the current state.
    pub fn get_state(&self) -> V {
        self.state.read().clone()
    }

    /// Read state without cloning it.
    pub fn read<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&V) -> R,
    {
        let state = self.state.read();
        f(&state)
    }

    /// Merge a partial state into the current state.
    ///
    /// Empty patches are ignored and do not notify.
    pub fn set_state(&self, patch: Patch<V>) {
        if patch.is_empty() {
            return;
        }
        trace!(fields = patch.len(), "merging patch into store");
        self.write(|state| patch.apply_into(state));
    }

    /// Replace the whole state.
    pub fn replace_state(&self, next: V) {
        trace!("replacing store state");
        self.write(|state| *state = next);
    }

    /// Update the state using a function.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut V),
    {
        self.write(f);
    }

    fn write<F>(&self, f: F)
    where
        F: FnOnce(&mut V),
    {
        let (prev, next) = {
            let mut state = self.state.write();
            let prev = state.clone();
            f(&mut state);
            (prev, state.clone())
        };
        self.notify(&next, &prev);
    }

    /// Subscribe to state changes.
    ///
    /// The listener is called with `(next, previous)` after every write until
    /// the returned [`Subscription`] is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&V, &V) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.subscribers.write().push((id, Arc::new(listener)));

        let subscribers: Weak<Listeners<V>> = Arc::downgrade(&self.subscribers);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(subscribers) = subscribers.upgrade() {
                    subscribers.write().retain(|(other, _)| *other != id);
                }
            })),
        }
    }

    /// Subscribe to a slice of the state.
    ///
    /// The listener only fires when the selected value changes under
    /// `PartialEq`, and receives `(next, previous)` slices.
    pub fn subscribe_with_selector<U, S, F>(&self, selector: S, listener: F) -> Subscription
    where
        U: Clone + PartialEq + Send + 'static,
        S: Fn(&V) -> U + Send + Sync + 'static,
        F: Fn(&U, &U) + Send + Sync + 'static,
    {
        self.subscribe_with_selector_and_equality(selector, |a: &U, b: &U| a == b, listener)
    }

    /// Like [`Store::subscribe_with_selector`] with a custom equality function.
    pub fn subscribe_with_selector_and_equality<U, S, E, F>(
        &self,
        selector: S,
        equality: E,
        listener: F,
    ) -> Subscription
    where
        U: Clone + Send + 'static,
        S: Fn(&V) -> U + Send + Sync + 'static,
        E: Fn(&U, &U) -> bool + Send + Sync + 'static,
        F: Fn(&U, &U) + Send + Sync + 'static,
    {
        let current = Mutex::new(self.read(&selector));
        self.subscribe(move |next, _prev| {
            let selected = selector(next);
            let prev = {
                let mut current = current.lock();
                if equality(&current, &selected) {
                    return;
                }
                std::mem::replace(&mut *current, selected.clone())
            };
            listener(&selected, &prev);
        })
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Whether two handles point at the same store.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.state, &other.state)
    }

    /// Notify all subscribers of a state change.
    fn notify(&self, next: &V, prev: &V) {
        let listeners: Vec<Listener<V>> = self
            .subscribers
            .read()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(next, prev);
        }
    }
}

impl<V> Clone for Store<V> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            subscribers: Arc::clone(&self.subscribers),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

/// RAII guard for a store subscription.
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send + Sync>>,
}

impl Subscription {
    /// Keep the listener registered for the rest of the store's life.
    pub fn detach(mut self) {
        self.unsubscribe.take();
    }

    /// Remove the listener now.
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    crate::store_values! {
        #[derive(Debug, PartialEq)]
        struct AppState {
            key AppKey;
            field AppField;
            count: usize => Count,
            name: String => Name,
        }
    }

    fn app_state() -> AppState {
        AppState {
            count: 0,
            name: "test".to_string(),
        }
    }

    #[test]
    fn store_get_set() {
        let store = Store::new(app_state());

        assert_eq!(store.get_state().count, 0);

        store.set_state(Patch::single(AppField::Count(42)));

        assert_eq!(store.get_state().count, 42);
        assert_eq!(store.get_state().name, "test");
    }

    #[test]
    fn store_replace() {
        let store = Store::new(app_state());

        store.replace_state(AppState {
            count: 7,
            name: "updated".to_string(),
        });

        assert_eq!(
            store.get_state(),
            AppState {
                count: 7,
                name: "updated".to_string()
            }
        );
    }

    #[test]
    fn store_update() {
        let store = Store::new(app_state());

        store.update(|state| {
            state.count += 10;
        });

        assert_eq!(store.get_state().count, 10);
    }

    #[test]
    fn store_subscribe() {
        let store = Store::new(app_state());

        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let _subscription = store.subscribe(move |next, prev| {
            assert_eq!(next.count, prev.count + 1);
            call_count_clone.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(call_count.load(Ordering::SeqCst), 0);

        store.update(|state| state.count += 1);
        assert_eq!(call_count.load(Ordering::SeqCst), 1);

        store.update(|state| state.count += 1);
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn dropping_subscription_unsubscribes() {
        let store = Store::new(app_state());
        let calls = Arc::new(AtomicUsize::new(0));

        let subscription = store.subscribe({
            let calls = calls.clone();
            move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });
        store.update(|state| state.count += 1);
        drop(subscription);
        store.update(|state| state.count += 1);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn empty_patch_does_not_notify() {
        let store = Store::new(app_state());
        let calls = Arc::new(AtomicUsize::new(0));
        let _subscription = store.subscribe({
            let calls = calls.clone();
            move |_, _| {
                calls.fetch_add(1, Ordering::SeqCst);
            }
        });

        store.set_state(Patch::new());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn selector_subscription_fires_on_slice_change_only() {
        let store = Store::new(app_state());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let _subscription = store.subscribe_with_selector(|state: &AppState| state.name.clone(), {
            let seen = seen.clone();
            move |next: &String, prev: &String| seen.lock().push((prev.clone(), next.clone()))
        });

        store.set_state(Patch::single(AppField::Count(5)));
        store.set_state(Patch::single(AppField::Name("next".to_string())));
        store.set_state(Patch::single(AppField::Name("next".to_string())));

        assert_eq!(
            *seen.lock(),
            vec![("test".to_string(), "next".to_string())]
        );
    }
}
