use crate::error::{Result, StoreError};
use crate::store::{Patch, StoreValues};
use std::any::Any;
use std::cell::RefCell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

type ProvidedStore = Arc<dyn Any + Send + Sync>;

// Thread-local stack of active providers, innermost last.
thread_local! {
    static PROVIDER_STACK: RefCell<Vec<(usize, ProvidedStore)>> = RefCell::new(vec![]);
}

static NEXT_CONTEXT_ID: AtomicUsize = AtomicUsize::new(0);

/// Initial value handed to a store factory: an overlay for the defaults.
pub struct InitialValue<V: StoreValues> {
    pub initial_value: Option<Patch<V>>,
}

impl<V: StoreValues> InitialValue<V> {
    pub fn none() -> Self {
        Self {
            initial_value: None,
        }
    }

    /// Merge the overlay over `defaults`.
    pub fn apply(&self, defaults: &V) -> V {
        match &self.initial_value {
            Some(patch) => patch.overlay(defaults),
            None => defaults.clone(),
        }
    }
}

type Factory<V, S> = Arc<dyn Fn(InitialValue<V>) -> S + Send + Sync>;

/// A provider/consumer pair for one kind of store.
///
/// Each call to [`StoreContext::provide`] builds a fresh store with the factory
/// and makes it reachable through [`StoreContext::use_context`] for the duration
/// of the scope, on the current thread. Nested providers shadow outer ones.
///
/// # Examples
///
/// ```
/// use storekit::{Patch, Store, StoreContext};
///
/// storekit::store_values! {
///     pub struct Count {
///         key CountKey;
///         field CountField;
///         value: i32 => Value,
///     }
/// }
///
/// let context = StoreContext::new("Count", |init| Store::new(init.apply(&Count { value: 0 })));
///
/// let seen = context.provide(Some(Patch::single(CountField::Value(5))), || {
///     context.use_context().map(|store| store.get_state().value)
/// });
/// assert_eq!(seen.unwrap(), 5);
/// assert!(context.use_context().is_err());
/// ```
pub struct StoreContext<V: StoreValues, S> {
    id: usize,
    display_name: String,
    factory: Factory<V, S>,
}

impl<V, S> StoreContext<V, S>
where
    V: StoreValues,
    S: Clone + Send + Sync + 'static,
{
    pub fn new<F>(display_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(InitialValue<V>) -> S + Send + Sync + 'static,
    {
        Self {
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::SeqCst),
            display_name: display_name.into(),
            factory: Arc::new(factory),
        }
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Build a store outside of any provider scope.
    pub fn create(&self, initial: Option<Patch<V>>) -> S {
        (self.factory)(InitialValue {
            initial_value: initial,
        })
    }

    /// Run `f` with a freshly created store provided to it.
    ///
    /// The store is dropped from the provider stack when `f` returns or panics.
    pub fn provide<F, R>(&self, initial: Option<Patch<V>>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let store = self.create(initial);
        self.provide_store(store, f)
    }

    /// Run `f` with an existing store provided to it.
    pub fn provide_store<F, R>(&self, store: S, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        debug!(context = %self.display_name, "providing store");
        let provided: ProvidedStore = Arc::new(store);
        PROVIDER_STACK.with(|stack| {
            stack.borrow_mut().push((self.id, provided));
        });

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f));

        PROVIDER_STACK.with(|stack| {
            stack.borrow_mut().pop();
        });

        match result {
            Ok(r) => r,
            Err(e) => std::panic::resume_unwind(e),
        }
    }

    /// The store of the innermost enclosing provider.
    ///
    /// Fails with [`StoreError::MissingProvider`] outside any provider scope.
    pub fn use_context(&self) -> Result<S> {
        PROVIDER_STACK.with(|stack| {
            stack
                .borrow()
                .iter()
                .rev()
                .find(|(id, _)| *id == self.id)
                .and_then(|(_, store)| store.downcast_ref::<S>().cloned())
                .ok_or_else(|| StoreError::MissingProvider(self.display_name.clone()))
        })
    }

    /// Whether a provider for this context is active on this thread.
    pub fn is_provided(&self) -> bool {
        PROVIDER_STACK.with(|stack| stack.borrow().iter().any(|(id, _)| *id == self.id))
    }
}

/// Create a provider/consumer pair from a store factory.
pub fn create_store_context<V, S, F>(display_name: impl Into<String>, factory: F) -> StoreContext<V, S>
where
    V: StoreValues,
    S: Clone + Send + Sync + 'static,
    F: Fn(InitialValue<V>) -> S + Send + Sync + 'static,
{
    StoreContext::new(display_name, factory)
}
