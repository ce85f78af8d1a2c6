use crate::error::{Result, StoreError};
use crate::extensions::storage::KeyValueStorage;
use crate::store::{FieldKey, Patch, Store, StoreValues};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Which fields a snapshot includes.
///
/// An empty whitelist means every field; the blacklist always excludes.
#[derive(Debug, Clone)]
pub struct PersistOptions<K> {
    pub whitelist: Vec<K>,
    pub blacklist: Vec<K>,
}

impl<K> Default for PersistOptions<K> {
    fn default() -> Self {
        Self {
            whitelist: Vec::new(),
            blacklist: Vec::new(),
        }
    }
}

impl<K: PartialEq> PersistOptions<K> {
    pub fn whitelist(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            whitelist: keys.into_iter().collect(),
            blacklist: Vec::new(),
        }
    }

    pub fn blacklist(keys: impl IntoIterator<Item = K>) -> Self {
        Self {
            whitelist: Vec::new(),
            blacklist: keys.into_iter().collect(),
        }
    }

    /// Whether `key` goes into a snapshot.
    pub fn includes(&self, key: &K) -> bool {
        (self.whitelist.is_empty() || self.whitelist.contains(key)) && !self.blacklist.contains(key)
    }
}

/// Save/load actions for one store and one storage key.
///
/// Snapshots are JSON objects keyed by field name, so the values type must
/// serialize every field under its declared name. Renamed or skipped fields
/// fail with [`StoreError::Serialization`] instead of being dropped.
pub struct Persist<V: StoreValues> {
    store: Store<V>,
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    options: PersistOptions<V::Key>,
}

impl<V> Persist<V>
where
    V: StoreValues + Serialize + DeserializeOwned,
{
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Write the filtered projection of the current state.
    pub fn save(&self) -> Result<()> {
        let state = self.store.get_state();
        let fields = to_object(&state)?;
        let snapshot: Map<String, Value> = fields
            .into_iter()
            .filter(|(name, _)| {
                V::Key::from_name(name).map_or(false, |key| self.options.includes(&key))
            })
            .collect();

        let fields = snapshot.len();
        let raw = serde_json::to_string(&Value::Object(snapshot))
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        self.storage.set_item(&self.key, &raw)?;
        debug!(key = %self.key, fields, "saved snapshot");
        Ok(())
    }

    /// Merge the stored snapshot into the current state.
    ///
    /// Returns `Ok(false)` without touching the store when nothing (or only
    /// whitespace) is stored.
    /// Malformed snapshots fail with [`StoreError::Deserialization`] and leave
    /// the store unchanged; unknown field names are skipped.
    pub fn load(&self) -> Result<bool> {
        let raw = match self.storage.get_item(&self.key)? {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => {
                trace!(key = %self.key, "no snapshot stored");
                return Ok(false);
            }
        };

        let snapshot: Map<String, Value> = serde_json::from_str(&raw)?;
        let patch = self.decode(snapshot)?;
        debug!(key = %self.key, fields = patch.len(), "loaded snapshot");
        self.store.set_state(patch);
        Ok(true)
    }

    /// Remove the stored snapshot.
    pub fn clear(&self) -> Result<()> {
        self.storage.remove_item(&self.key)
    }

    fn decode(&self, snapshot: Map<String, Value>) -> Result<Patch<V>> {
        let (patch, unknown) = patch_from_object(&self.store.get_state(), snapshot)?;
        for field in unknown {
            warn!(key = %self.key, %field, "skipping unknown field in snapshot");
        }
        Ok(patch)
    }
}

impl<V: StoreValues> Clone for Persist<V> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            storage: Arc::clone(&self.storage),
            key: self.key.clone(),
            options: self.options.clone(),
        }
    }
}

/// Decode a JSON object of fields into a typed patch.
///
/// Decoding goes through a full values object: the fields are laid over `base`
/// and the touched keys are projected back out. Names that are not declared
/// fields are returned instead of decoded.
pub(crate) fn patch_from_object<V>(
    base: &V,
    object: Map<String, Value>,
) -> Result<(Patch<V>, Vec<String>)>
where
    V: StoreValues + Serialize + DeserializeOwned,
{
    let mut merged = to_object(base)?;
    let mut keys = Vec::with_capacity(object.len());
    let mut unknown = Vec::new();
    for (name, value) in object {
        match V::Key::from_name(&name) {
            Some(key) => {
                merged.insert(name, value);
                keys.push(key);
            }
            None => unknown.push(name),
        }
    }

    let next: V = serde_json::from_value(Value::Object(merged))?;
    Ok((Patch::project(&next, keys), unknown))
}

fn to_object<V: StoreValues + Serialize>(state: &V) -> Result<Map<String, Value>> {
    let fields =
        match serde_json::to_value(state).map_err(|e| StoreError::Serialization(e.to_string()))? {
            Value::Object(fields) => fields,
            other => {
                return Err(StoreError::Serialization(format!(
                    "state must serialize to an object, got {other}"
                )))
            }
        };

    let missing: Vec<&str> = V::key_names()
        .into_iter()
        .filter(|name| !fields.contains_key(*name))
        .collect();
    if !missing.is_empty() {
        return Err(StoreError::Serialization(format!(
            "fields not serialized under their declared names: {}",
            missing.join(", ")
        )));
    }
    Ok(fields)
}

/// Attach save/load actions for `key` in `storage` to `store`.
pub fn create_persist<V: StoreValues>(
    store: &Store<V>,
    storage: Arc<dyn KeyValueStorage>,
    key: impl Into<String>,
    options: PersistOptions<V::Key>,
) -> Persist<V> {
    Persist {
        store: store.clone(),
        storage,
        key: key.into(),
        options,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extensions::storage::MemoryStorage;
    use serde::Deserialize;

    crate::store_values! {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Settings {
            key SettingsKey;
            field SettingsField;
            volume: u8 => Volume,
            muted: bool => Muted,
            session: Option<String> => Session,
        }
    }

    fn defaults() -> Settings {
        Settings {
            volume: 50,
            muted: false,
            session: None,
        }
    }

    fn changed() -> Patch<Settings> {
        Patch::new()
            .with(SettingsField::Volume(80))
            .with(SettingsField::Muted(true))
            .with(SettingsField::Session(Some("abc".to_string())))
    }

    #[test]
    fn load_without_snapshot_is_a_no_op() {
        let store = Store::new(defaults());
        let persist = create_persist(
            &store,
            Arc::new(MemoryStorage::new()),
            "settings",
            PersistOptions::default(),
        );

        assert!(!persist.load().unwrap());
        assert_eq!(store.get_state(), defaults());
    }

    #[test]
    fn round_trip_keeps_only_included_fields() {
        let storage: Arc<dyn KeyValueStorage> = Arc::new(MemoryStorage::new());
        let options = PersistOptions {
            whitelist: vec![SettingsKey::Volume, SettingsKey::Muted, SettingsKey::Session],
            blacklist: vec![SettingsKey::Session],
        };

        let store = Store::new(defaults());
        store.set_state(changed());
        create_persist(&store, storage.clone(), "settings", options.clone())
            .save()
            .unwrap();

        let fresh = Store::new(defaults());
        let persist = create_persist(&fresh, storage, "settings", options);
        assert!(persist.load().unwrap());

        assert_eq!(
            fresh.get_state(),
            Settings {
                volume: 80,
                muted: true,
                session: None,
            }
        );
    }

    #[test]
    fn snapshot_is_a_json_object_of_fields() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Store::new(defaults());
        create_persist(
            &store,
            storage.clone(),
            "settings",
            PersistOptions::whitelist([SettingsKey::Volume]),
        )
        .save()
        .unwrap();

        let raw = storage.get_item("settings").unwrap().unwrap();
        assert_eq!(raw, r#"{"volume":50}"#);
    }

    #[test]
    fn corrupt_snapshot_fails_and_leaves_state() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set_item("settings", "{\"volume\": \"loud\"}").unwrap();

        let store = Store::new(defaults());
        let persist = create_persist(&store, storage.clone(), "settings", PersistOptions::default());

        assert!(matches!(persist.load(), Err(StoreError::Deserialization(_))));
        assert_eq!(store.get_state(), defaults());

        storage.set_item("settings", "not json").unwrap();
        assert!(matches!(persist.load(), Err(StoreError::Deserialization(_))));
    }

    #[test]
    fn unknown_snapshot_fields_are_skipped() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .set_item("settings", r#"{"muted":true,"theme":"dark"}"#)
            .unwrap();

        let store = Store::new(defaults());
        let persist = create_persist(&store, storage, "settings", PersistOptions::default());

        assert!(persist.load().unwrap());
        assert!(store.get_state().muted);
    }

    crate::store_values! {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Flags {
            key FlagsKey;
            field FlagsField;
            #[serde(rename = "isLoading")]
            is_loading: bool => IsLoading,
            count: u32 => Count,
        }
    }

    #[test]
    fn renamed_fields_fail_instead_of_dropping() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Store::new(Flags {
            is_loading: true,
            count: 7,
        });
        let persist = create_persist(&store, storage.clone(), "flags", PersistOptions::default());

        match persist.save() {
            Err(StoreError::Serialization(message)) => assert!(message.contains("is_loading")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(storage.get_item("flags").unwrap(), None);
    }

    #[test]
    fn empty_snapshot_counts_as_missing() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Store::new(defaults());
        let persist = create_persist(&store, storage.clone(), "settings", PersistOptions::default());

        storage.set_item("settings", "").unwrap();
        assert!(!persist.load().unwrap());
        storage.set_item("settings", "  \n").unwrap();
        assert!(!persist.load().unwrap());
        assert_eq!(store.get_state(), defaults());
    }

    #[test]
    fn clear_removes_snapshot() {
        let storage = Arc::new(MemoryStorage::new());
        let store = Store::new(defaults());
        let persist = create_persist(&store, storage.clone(), "settings", PersistOptions::default());

        persist.save().unwrap();
        persist.clear().unwrap();
        assert!(storage.is_empty());
        assert!(!persist.load().unwrap());
    }
}
