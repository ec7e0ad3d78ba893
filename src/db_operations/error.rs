use thiserror::Error;

/// Failures raised by a collection backend.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectionError {
    #[error("Storage error during {operation}: {message}")]
    Storage { operation: String, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid write operation: {0}")]
    InvalidOperation(String),

    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),
}

impl CollectionError {
    /// Adapter for `map_err` on sled results.
    pub fn from_sled(operation: &str) -> impl Fn(sled::Error) -> CollectionError + '_ {
        move |e| CollectionError::Storage {
            operation: operation.to_string(),
            message: e.to_string(),
        }
    }

    pub fn from_serde(context: &str) -> impl Fn(serde_json::Error) -> CollectionError + '_ {
        move |e| CollectionError::Serialization(format!("{context}: {e}"))
    }
}
