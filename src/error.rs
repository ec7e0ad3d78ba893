//! Crate-wide error type.
//!
//! Validation failures are normally returned as structured results
//! ([`ValidationResult`], [`UpdateValidation`]) so the route layer can choose a
//! response. When a caller wants to propagate them with `?` they are wrapped in
//! [`ButtressError::SchemaValidation`] and [`ButtressError::UpdatePath`].
//! Execution and precondition failures are always hard errors.

use crate::db_operations::CollectionError;
use crate::schema::types::{IdError, SchemaError};
use crate::schema::ValidationResult;
use crate::update::UpdateValidation;

#[derive(Debug, thiserror::Error)]
pub enum ButtressError {
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),
    #[error("Schema validation failed: {0}")]
    SchemaValidation(ValidationResult),
    #[error("Invalid update: {0}")]
    UpdatePath(UpdateValidation),
    #[error("Update failed: {0}")]
    UpdateExecution(String),
    #[error("Projection precondition failed: {0}")]
    ProjectionPrecondition(String),
    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),
    #[error("Invalid identifier: {0}")]
    InvalidId(#[from] IdError),
    #[error("Document not found: {0}")]
    NotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl ButtressError {
    /// HTTP status the route layer should answer with.
    ///
    /// Failed bulk writes count as client errors: they almost always come
    /// from a path that no longer fits the stored document.
    pub fn status_code(&self) -> u16 {
        match self {
            ButtressError::SchemaValidation(_)
            | ButtressError::UpdatePath(_)
            | ButtressError::UpdateExecution(_)
            | ButtressError::InvalidId(_) => 400,
            ButtressError::NotFound(_) => 404,
            ButtressError::Schema(_)
            | ButtressError::ProjectionPrecondition(_)
            | ButtressError::Collection(_)
            | ButtressError::Config(_)
            | ButtressError::Io(_)
            | ButtressError::Serde(_) => 500,
        }
    }
}

pub type ButtressResult<T> = Result<T, ButtressError>;
