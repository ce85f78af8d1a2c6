//! Store configuration.
//!
//! Diagnostics are controlled by an explicit [`Mode`] passed to constructors,
//! never by a process-wide flag. [`StoreOptions`] can be deserialized from JSON
//! so the same settings can live in a config file.

use crate::error::{Result, StoreError};
use crate::store::{FieldKey, StoreValues};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Build mode controlling development-only behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    pub fn is_development(self) -> bool {
        self == Mode::Development
    }

    /// Parse a mode name such as `"development"` or `"production"`.
    ///
    /// Anything other than a development spelling is production.
    pub fn from_env_value(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Mode::Development,
            _ => Mode::Production,
        }
    }
}

/// Persistence settings by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistConfig {
    /// Storage key the snapshot is written under.
    pub name: String,
    #[serde(default)]
    pub whitelist: Vec<String>,
    #[serde(default)]
    pub blacklist: Vec<String>,
}

impl PersistConfig {
    /// Resolve field names to keys of `V`.
    ///
    /// Unknown names fail with [`StoreError::InvalidKeys`].
    pub fn resolve<V: StoreValues>(
        &self,
        store: &str,
    ) -> Result<crate::extensions::PersistOptions<V::Key>> {
        Ok(crate::extensions::PersistOptions {
            whitelist: resolve_keys::<V>(store, &self.whitelist)?,
            blacklist: resolve_keys::<V>(store, &self.blacklist)?,
        })
    }
}

/// Options for building a store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Display name, used in logs and error messages.
    pub name: String,
    #[serde(default)]
    pub mode: Mode,
    #[serde(default)]
    pub persist: Option<PersistConfig>,
    /// Field names kept by a reset.
    #[serde(default)]
    pub reset_blacklist: Vec<String>,
    /// Reset the store when a mounted scope exits.
    #[serde(default)]
    pub reset_on_unmount: bool,
    /// Untyped initial values, validated against the declared keys.
    #[serde(default)]
    pub initial: Option<serde_json::Map<String, Value>>,
}

impl StoreOptions {
    pub fn from_json(raw: &str) -> Result<Self> {
        Ok(serde_json::from_str(raw)?)
    }
}

/// Check that every key of an untyped initial state is a declared field.
///
/// Unlike typed [`Patch`](crate::Patch)es, untyped maps can name anything, so
/// this runs in every mode.
pub fn validate_initial_state<V: StoreValues>(
    initial: &serde_json::Map<String, Value>,
    display_name: &str,
) -> Result<()> {
    let names: Vec<String> = initial.keys().cloned().collect();
    resolve_keys::<V>(display_name, &names).map(|_| ())
}

pub(crate) fn resolve_keys<V: StoreValues>(store: &str, names: &[String]) -> Result<Vec<V::Key>> {
    let mut keys = Vec::with_capacity(names.len());
    let mut invalid = Vec::new();
    for name in names {
        match V::Key::from_name(name) {
            Some(key) => keys.push(key),
            None => invalid.push(name.clone()),
        }
    }
    if !invalid.is_empty() {
        return Err(StoreError::InvalidKeys {
            store: store.to_string(),
            invalid,
            valid: V::key_names().into_iter().map(String::from).collect(),
        });
    }
    Ok(keys)
}
