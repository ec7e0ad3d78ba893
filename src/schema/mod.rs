pub mod coercion;
pub mod flatten;
pub mod populator;
pub mod registry;
pub mod render;
pub mod types;
pub mod validator;

pub use flatten::{flatten_body, flatten_properties, flatten_schema};
pub use populator::{populate, populate_document};
pub use registry::{CompiledSchema, SchemaRegistry};
pub use validator::{validate_body, validate_flattened, ValidationResult};

// Re-export the description types at the schema module level
pub use types::{
    BodyEntry, FieldConfig, FieldType, FlattenedBody, FlattenedSchema, ObjectId,
    SchemaDescription, SchemaError,
};

use serde_json::Value;

/// Validates one document, or each document of an array, against a schema
/// description. Only the first failing document is reported.
pub fn validate(schema: &SchemaDescription, body: &Value) -> Result<ValidationResult, SchemaError> {
    let flattened = flatten_schema(schema)?;
    Ok(validate_body(&flattened, body))
}

/// Reduces a body to the schema's application properties: declared fields
/// only, defaults filled in, values coerced. Arrays are populated element-wise.
pub fn apply_app_properties(schema: &SchemaDescription, body: &Value) -> Result<Value, SchemaError> {
    let flattened = flatten_schema(schema)?;
    Ok(match body {
        Value::Array(documents) => Value::Array(
            documents
                .iter()
                .map(|document| populate_document(&flattened, document))
                .collect(),
        ),
        document => populate_document(&flattened, document),
    })
}
