//! Partial updates addressed by dotted paths.
//!
//! A [`PathContext`] lists the paths a collection accepts. It is derived from
//! the schema and layered under caller-supplied base paths. Requests are
//! validated against it in full before anything is written; validated
//! updates then run one at a time, each as a single bulk write.

pub mod executor;
pub mod path_context;
pub mod validation;

pub use executor::{execute_update, execute_updates, UpdateResult};
pub use path_context::{extend_path_context, PathContext, PathSpec, UpdateType};
pub use validation::{
    check_update, check_updates, validate_requests, UpdateRequest, UpdateValidation,
    ValidatedUpdate,
};

use crate::db_operations::Collection;
use crate::error::{ButtressError, ButtressResult};
use crate::schema::flatten::flatten_schema;
use crate::schema::types::{ObjectId, SchemaDescription, SchemaError};
use serde_json::Value;

/// Validates one update request, or an array of them, against the paths
/// `schema` allows on top of `base`.
pub fn validate_update(
    base: &PathContext,
    schema: &SchemaDescription,
    body: &Value,
) -> Result<UpdateValidation, SchemaError> {
    let flattened = flatten_schema(schema)?;
    let context = extend_path_context(base, &flattened, "")?;
    Ok(validate_requests(&context, &flattened, &UpdateRequest::from_body(body)))
}

/// Validates then applies one update request, or an array of them, to the
/// document `id` in `collection`.
///
/// Nothing is written unless every request is valid; a failing request is
/// returned as [`ButtressError::UpdatePath`].
pub async fn update_by_path(
    base: &PathContext,
    schema: &SchemaDescription,
    collection: &dyn Collection,
    body: &Value,
    id: ObjectId,
) -> ButtressResult<Vec<UpdateResult>> {
    let flattened = flatten_schema(schema)?;
    let context = extend_path_context(base, &flattened, "")?;
    let updates = check_updates(&context, &flattened, &UpdateRequest::from_body(body))
        .map_err(ButtressError::UpdatePath)?;
    execute_updates(collection, id, updates).await
}
