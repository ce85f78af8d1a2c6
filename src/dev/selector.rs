use parking_lot::Mutex;
use std::sync::Arc;

type Equality<U> = Arc<dyn Fn(&U, &U) -> bool + Send + Sync>;

/// A selector that remembers its most recent result.
///
/// When a new result is equal to the cached one, the cached `Arc` is returned,
/// so callers can compare results with [`Arc::ptr_eq`]. Only one result is
/// retained.
pub struct Selector<T, U> {
    select: Arc<dyn Fn(&T) -> U + Send + Sync>,
    equality: Equality<U>,
    cached: Arc<Mutex<Option<Arc<U>>>>,
}

impl<T, U> Selector<T, U> {
    /// Run the selector against `state`.
    pub fn select(&self, state: &T) -> Arc<U> {
        let result = (self.select)(state);
        let mut cached = self.cached.lock();
        match cached.as_ref() {
            Some(previous) if (self.equality)(previous, &result) => Arc::clone(previous),
            _ => {
                let result = Arc::new(result);
                *cached = Some(Arc::clone(&result));
                result
            }
        }
    }

    /// Forget the cached result.
    pub fn invalidate(&self) {
        self.cached.lock().take();
    }
}

impl<T, U> Clone for Selector<T, U> {
    fn clone(&self) -> Self {
        Self {
            select: Arc::clone(&self.select),
            equality: Arc::clone(&self.equality),
            cached: Arc::clone(&self.cached),
        }
    }
}

/// Create a selector memoized under `PartialEq`.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use storekit::create_selector;
///
/// let evens = create_selector(|numbers: &Vec<u32>| {
///     numbers.iter().copied().filter(|n| n % 2 == 0).collect::<Vec<_>>()
/// });
///
/// let first = evens.select(&vec![1, 2, 3, 4]);
/// let second = evens.select(&vec![2, 4, 5]);
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
pub fn create_selector<T, U, F>(select: F) -> Selector<T, U>
where
    T: 'static,
    U: PartialEq + 'static,
    F: Fn(&T) -> U + Send + Sync + 'static,
{
    create_selector_with(select, |a: &U, b: &U| a == b)
}

/// Create a selector memoized under a custom equality function.
pub fn create_selector_with<T, U, F, E>(select: F, equality: E) -> Selector<T, U>
where
    T: 'static,
    U: 'static,
    F: Fn(&T) -> U + Send + Sync + 'static,
    E: Fn(&U, &U) -> bool + Send + Sync + 'static,
{
    Selector {
        select: Arc::new(select),
        equality: Arc::new(equality),
        cached: Arc::new(Mutex::new(None)),
    }
}
