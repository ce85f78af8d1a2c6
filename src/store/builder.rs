use crate::config::{resolve_keys, validate_initial_state, Mode, StoreOptions};
use crate::dev::{create_dev_logger, DevLogger};
use crate::error::{Result, StoreError};
use crate::extensions::{
    create_batch_actions, create_persist, with_reset, BatchActions, KeyValueStorage, Persist,
    PersistOptions, ResetAction, ResetOptions,
};
use crate::setters::{create_setters, Setters};
use crate::store::{Patch, Store, StoreValues, Subscription};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Declarative construction of a store with its setters and extensions.
///
/// # Examples
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use storekit::{Mode, StoreBuilder};
///
/// storekit::store_values! {
///     #[derive(Debug, Serialize, Deserialize)]
///     pub struct Volume {
///         key VolumeKey;
///         field VolumeField;
///         level: u8 => Level,
///     }
/// }
///
/// let volume = StoreBuilder::new("Volume", Volume { level: 5 })
///     .mode(Mode::Production)
///     .build()
///     .unwrap();
///
/// volume.setters().call("setVolumeLevel", VolumeField::Level(9)).unwrap();
/// assert_eq!(volume.state().level, 9);
/// ```
pub struct StoreBuilder<V: StoreValues> {
    name: String,
    defaults: V,
    mode: Mode,
    initial: Option<Patch<V>>,
    setter_prefix: Option<String>,
    persist: Option<(Arc<dyn KeyValueStorage>, String, PersistOptions<V::Key>)>,
    reset: ResetOptions<V::Key>,
    reset_on_unmount: bool,
    load_on_build: bool,
}

impl<V> StoreBuilder<V>
where
    V: StoreValues + Serialize + DeserializeOwned + fmt::Debug,
{
    pub fn new(name: impl Into<String>, defaults: V) -> Self {
        Self {
            name: name.into(),
            defaults,
            mode: Mode::default(),
            initial: None,
            setter_prefix: None,
            persist: None,
            reset: ResetOptions::default(),
            reset_on_unmount: false,
            load_on_build: true,
        }
    }

    /// Builder driven by configuration.
    ///
    /// Field names in `options` are resolved against `V`; unknown names fail
    /// with [`StoreError::InvalidKeys`]. Persistence needs `storage`.
    pub fn from_options(
        options: &StoreOptions,
        defaults: V,
        storage: Option<Arc<dyn KeyValueStorage>>,
    ) -> Result<Self> {
        let mut builder = Self::new(options.name.clone(), defaults).mode(options.mode);

        if let Some(initial) = &options.initial {
            validate_initial_state::<V>(initial, &options.name)?;
            let (patch, _) =
                crate::extensions::patch_from_object(&builder.defaults, initial.clone())?;
            builder = builder.initial(patch);
        }

        let blacklist = resolve_keys::<V>(&options.name, &options.reset_blacklist)?;
        builder = builder
            .reset(ResetOptions { blacklist })
            .reset_on_unmount(options.reset_on_unmount);

        if let Some(persist) = &options.persist {
            let storage = storage.ok_or_else(|| {
                StoreError::Storage(format!(
                    "{} persists to {:?} but no storage was given",
                    options.name, persist.name
                ))
            })?;
            let resolved = persist.resolve::<V>(&options.name)?;
            builder = builder.persist(storage, persist.name.clone(), resolved);
        }

        Ok(builder)
    }

    pub fn mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Overlay applied over the defaults at build time.
    pub fn initial(mut self, patch: Patch<V>) -> Self {
        self.initial = Some(patch);
        self
    }

    /// Prefix for generated setter names; the store name by default.
    pub fn setter_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.setter_prefix = Some(prefix.into());
        self
    }

    pub fn persist(
        mut self,
        storage: Arc<dyn KeyValueStorage>,
        key: impl Into<String>,
        options: PersistOptions<V::Key>,
    ) -> Self {
        self.persist = Some((storage, key.into(), options));
        self
    }

    pub fn reset(mut self, options: ResetOptions<V::Key>) -> Self {
        self.reset = options;
        self
    }

    /// Whether [`BundledStore::mount`] resets the store when its scope exits.
    pub fn reset_on_unmount(mut self, reset: bool) -> Self {
        self.reset_on_unmount = reset;
        self
    }

    /// Whether `build` loads a stored snapshot. On by default.
    pub fn load_on_build(mut self, load: bool) -> Self {
        self.load_on_build = load;
        self
    }

    pub fn build(self) -> Result<BundledStore<V>> {
        let initial = match &self.initial {
            Some(patch) => patch.overlay(&self.defaults),
            None => self.defaults.clone(),
        };
        let store = Store::new(initial.clone());

        let prefix = self.setter_prefix.as_deref().unwrap_or(&self.name);
        let setters = create_setters(&store, prefix);
        let reset = with_reset(&store, initial, self.reset);
        let batch = Arc::new(create_batch_actions(&store));

        let persist = self
            .persist
            .map(|(storage, key, options)| create_persist(&store, storage, key, options));
        if let (Some(persist), true) = (&persist, self.load_on_build) {
            persist.load()?;
        }

        let logger = create_dev_logger(self.name.clone(), self.mode);
        let logging = logger
            .as_ref()
            .map(|logger| Arc::new(logger.attach(&store)));

        debug!(
            store = %self.name,
            setters = setters.len(),
            persisted = persist.is_some(),
            "built store"
        );

        Ok(BundledStore {
            name: self.name,
            store,
            setters,
            reset,
            persist,
            batch,
            logger,
            reset_on_unmount: self.reset_on_unmount,
            _logging: logging,
        })
    }
}

/// A store together with its generated setters and extensions.
#[derive(Clone)]
pub struct BundledStore<V: StoreValues> {
    name: String,
    store: Store<V>,
    setters: Setters<V>,
    reset: ResetAction<V>,
    persist: Option<Persist<V>>,
    batch: Arc<BatchActions<V>>,
    logger: Option<DevLogger>,
    reset_on_unmount: bool,
    _logging: Option<Arc<Subscription>>,
}

// Resets the store when dropped, including on unwind.
struct UnmountGuard<'a, V: StoreValues> {
    reset: Option<&'a ResetAction<V>>,
}

impl<V: StoreValues> Drop for UnmountGuard<'_, V> {
    fn drop(&mut self) {
        if let Some(reset) = self.reset {
            reset.reset();
        }
    }
}

impl<V: StoreValues> BundledStore<V> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &Store<V> {
        &self.store
    }

    /// Clone of the current state.
    pub fn state(&self) -> V {
        self.store.get_state()
    }

    pub fn setters(&self) -> &Setters<V> {
        &self.setters
    }

    pub fn reset(&self) -> &ResetAction<V> {
        &self.reset
    }

    /// Persistence actions, when configured.
    pub fn persist(&self) -> Option<&Persist<V>> {
        self.persist.as_ref()
    }

    pub fn batch(&self) -> &BatchActions<V> {
        &self.batch
    }

    /// The dev logger, present in development mode only.
    pub fn logger(&self) -> Option<&DevLogger> {
        self.logger.as_ref()
    }

    /// Run `f` as one mounted scope of the store.
    ///
    /// With `reset_on_unmount` set, the store is reset when `f` returns or
    /// panics.
    pub fn mount<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&Self) -> R,
    {
        let _guard = UnmountGuard {
            reset: self.reset_on_unmount.then_some(&self.reset),
        };
        f(self)
    }

    /// Log an action through the dev logger, if any.
    pub fn log_action(&self, action: &str, payload: Option<&dyn fmt::Debug>) {
        if let Some(logger) = &self.logger {
            logger.log_action(action, payload);
        }
    }
}
