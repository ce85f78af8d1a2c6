use crate::error::{Result, StoreError};
use crate::store::{FieldKey, Patch, Store, StoreValues};
use std::collections::BTreeMap;

/// Name of the generated setter for `key`: `set<Prefix><Key>`.
///
/// Each `_`-separated segment of the key gets its first letter upper-cased,
/// so `is_loading` becomes `IsLoading` and `items` becomes `Items`.
pub fn setter_name(prefix: &str, key: &str) -> String {
    let mut name = String::with_capacity(3 + prefix.len() + key.len());
    name.push_str("set");
    name.push_str(prefix);
    for segment in key.split('_').filter(|segment| !segment.is_empty()) {
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            name.extend(first.to_uppercase());
            name.push_str(chars.as_str());
        }
    }
    name
}

/// A generated single-field setter bound to one store.
pub struct Setter<V: StoreValues> {
    key: V::Key,
    store: Store<V>,
}

impl<V: StoreValues> Setter<V> {
    /// The field this setter writes.
    pub fn key(&self) -> V::Key {
        self.key
    }

    /// Set the field to `value`, leaving every other field untouched.
    pub fn set(&self, value: V::Field) -> Result<()> {
        let got = V::key_of(&value);
        if got != self.key {
            return Err(StoreError::FieldMismatch {
                expected: self.key.name(),
                got: got.name(),
            });
        }
        self.store.set_state(Patch::single(value));
        Ok(())
    }
}

impl<V: StoreValues> Clone for Setter<V> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            store: self.store.clone(),
        }
    }
}

/// Generated setters, keyed by setter name.
pub struct Setters<V: StoreValues> {
    setters: BTreeMap<String, Setter<V>>,
}

impl<V: StoreValues> Setters<V> {
    pub fn get(&self, name: &str) -> Option<&Setter<V>> {
        self.setters.get(name)
    }

    /// Call the setter registered under `name`.
    pub fn call(&self, name: &str, value: V::Field) -> Result<()> {
        self.setters
            .get(name)
            .ok_or_else(|| StoreError::UnknownSetter(name.to_string()))?
            .set(value)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.setters.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Setter<V>)> {
        self.setters.iter().map(|(name, setter)| (name.as_str(), setter))
    }

    pub fn len(&self) -> usize {
        self.setters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.setters.is_empty()
    }
}

impl<V: StoreValues> Clone for Setters<V> {
    fn clone(&self) -> Self {
        Self {
            setters: self.setters.clone(),
        }
    }
}

/// Generate one setter per declared field of `V`.
///
/// Colliding names are not detected; the later key replaces the earlier one.
pub fn create_setters<V: StoreValues>(store: &Store<V>, prefix: &str) -> Setters<V> {
    let setters = V::keys()
        .iter()
        .map(|&key| {
            let setter = Setter {
                key,
                store: store.clone(),
            };
            (setter_name(prefix, key.name()), setter)
        })
        .collect();
    Setters { setters }
}
