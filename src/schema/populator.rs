use crate::schema::coercion::{coerce_and_validate, default_for};
use crate::schema::flatten::{flatten_body, inflate, resolve_body_value};
use crate::schema::types::{BodyEntry, FlattenedSchema};
use log::trace;
use serde_json::{Map, Value};

/// Builds a storage-ready object from a flattened body.
///
/// The result holds exactly the schema's fields: unknown body entries are
/// dropped, absent fields take their defaults and present values are coerced
/// where their type allows it. Array fields with an element schema have every
/// element populated the same way.
#[must_use]
pub fn populate(schema: &FlattenedSchema, body: &[BodyEntry]) -> Map<String, Value> {
    let mut populated = Map::new();

    for (path, config) in schema.iter() {
        let mut value = resolve_body_value(path, config, body).unwrap_or_else(|| default_for(config));
        // Normalisation only; validation is reported by the validator.
        coerce_and_validate(&mut value, config);

        if let (true, Some(element_schema), Value::Array(items)) =
            (config.has_element_schema(), &config.schema, &mut value)
        {
            for item in items.iter_mut() {
                *item = Value::Object(populate(element_schema, &flatten_body(item)));
            }
        }

        let segments: Vec<&str> = path.split('.').collect();
        inflate(&mut populated, &segments, value);
    }

    trace!("populated {} top-level fields", populated.len());
    populated
}

/// Populates a single document given as a nested value.
#[must_use]
pub fn populate_document(schema: &FlattenedSchema, document: &Value) -> Value {
    Value::Object(populate(schema, &flatten_body(document)))
}
