//! Error types for store operations.

use thiserror::Error;

/// Main error type for store, context and extension operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Invalid keys found in {store} initial state: {}. Valid keys are: {}", .invalid.join(", "), .valid.join(", "))]
    InvalidKeys {
        store: String,
        invalid: Vec<String>,
        valid: Vec<String>,
    },

    #[error("{0} store accessed outside of its provider")]
    MissingProvider(String),

    #[error("Field mismatch: setter for `{expected}` called with `{got}`")]
    FieldMismatch {
        expected: &'static str,
        got: &'static str,
    },

    #[error("Unknown setter: {0}")]
    UnknownSetter(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            StoreError::Deserialization(e.to_string())
        } else {
            StoreError::Serialization(e.to_string())
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
