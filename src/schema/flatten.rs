//! Flattening of schema trees and request bodies into dotted-path form.

use crate::schema::types::date::is_date_value;
use crate::schema::types::{
    BodyEntry, FieldConfig, FieldType, FlattenedBody, FlattenedSchema, ObjectId,
    SchemaDescription, SchemaError,
};
use log::trace;
use serde_json::{Map, Value};

/// Keys starting with this prefix are storage internals and never flattened.
pub const INTERNAL_PREFIX: char = '_';

const META_PREFIX: &str = "__";
const SUB_SCHEMA_KEY: &str = "__schema";

/// Flattens `schema.properties` into a path -> config map.
///
/// A node is a leaf when it has no keys outside the `__` metadata namespace.
/// A leaf's `__schema` tree is flattened recursively and attached to its
/// config so array elements can be validated with the same machinery.
pub fn flatten_schema(schema: &SchemaDescription) -> Result<FlattenedSchema, SchemaError> {
    let flattened = flatten_properties(&schema.properties)?;
    trace!("Flattened schema {}: {} fields", schema.name, flattened.len());
    Ok(flattened)
}

/// Flattens a bare properties tree (the contents of `properties` or `__schema`).
pub fn flatten_properties(properties: &Map<String, Value>) -> Result<FlattenedSchema, SchemaError> {
    let mut flattened = FlattenedSchema::new();
    let mut path = Vec::new();
    for (property, node) in properties {
        walk_schema_node(property, node, &mut path, &mut flattened)?;
    }
    Ok(flattened)
}

fn walk_schema_node<'a>(
    property: &'a str,
    node: &'a Value,
    path: &mut Vec<&'a str>,
    flattened: &mut FlattenedSchema,
) -> Result<(), SchemaError> {
    path.push(property);

    let map = node.as_object().ok_or_else(|| {
        SchemaError::InvalidField(format!("{} must be an object node", path.join(".")))
    })?;

    let mut is_leaf = true;
    for (child, child_node) in map {
        if child.starts_with(META_PREFIX) {
            continue;
        }
        is_leaf = false;
        walk_schema_node(child, child_node, path, flattened)?;
    }

    if is_leaf {
        let joined = path.join(".");
        let mut config = FieldConfig::from_leaf(&joined, map)?;
        if let Some(sub) = map.get(SUB_SCHEMA_KEY) {
            let sub = sub.as_object().ok_or_else(|| {
                SchemaError::InvalidField(format!("{joined}: __schema must be an object"))
            })?;
            config.schema = Some(flatten_properties(sub)?);
        }
        flattened.insert(joined, config);
    }

    path.pop();
    Ok(())
}

/// True for values the body flattener must not descend into.
#[must_use]
pub fn is_leaf_value(value: &Value) -> bool {
    match value {
        Value::Object(_) => ObjectId::is_oid_value(value) || is_date_value(value),
        _ => true,
    }
}

/// Flattens an arbitrary body into ordered `{path, value}` pairs.
///
/// Arrays, nulls, primitives and identifier/date values are leaves; plain
/// objects are descended into. Keys starting with `_` are skipped at every
/// depth. Anything other than an object flattens to nothing.
#[must_use]
pub fn flatten_body(body: &Value) -> FlattenedBody {
    let mut flattened = Vec::new();
    if let Value::Object(map) = body {
        let mut path = Vec::new();
        for (property, value) in map {
            walk_body_node(property, value, &mut path, &mut flattened);
        }
    }
    trace!("flatten_body: {} properties", flattened.len());
    flattened
}

fn walk_body_node<'a>(
    property: &'a str,
    value: &'a Value,
    path: &mut Vec<&'a str>,
    flattened: &mut FlattenedBody,
) {
    if property.starts_with(INTERNAL_PREFIX) {
        return;
    }
    path.push(property);

    match value {
        Value::Object(map) if !is_leaf_value(value) => {
            for (child, child_value) in map {
                walk_body_node(child, child_value, path, flattened);
            }
        }
        _ => flattened.push(BodyEntry::new(path.join("."), value.clone())),
    }

    path.pop();
}

/// Writes `value` at `path` below `parent`, creating intermediate objects.
/// A non-object sitting on an intermediate segment is replaced.
pub fn inflate(parent: &mut Map<String, Value>, path: &[&str], value: Value) {
    match path {
        [] => {}
        [last] => {
            parent.insert((*last).to_string(), value);
        }
        [head, rest @ ..] => {
            let child = parent
                .entry((*head).to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !child.is_object() {
                *child = Value::Object(Map::new());
            }
            if let Value::Object(child) = child {
                inflate(child, rest, value);
            }
        }
    }
}

/// Looks up the body value for a schema field.
///
/// Exact path matches win. Object-typed fields are otherwise reassembled
/// from the entries below them, since the flattener descends into objects.
#[must_use]
pub fn resolve_body_value(path: &str, config: &FieldConfig, body: &[BodyEntry]) -> Option<Value> {
    if let Some(entry) = body.iter().find(|e| e.path == path) {
        return Some(entry.value.clone());
    }
    if config.field_type != FieldType::Object {
        return None;
    }

    let prefix = format!("{path}.");
    let mut object = Map::new();
    for entry in body {
        if let Some(rest) = entry.path.strip_prefix(&prefix) {
            let segments: Vec<&str> = rest.split('.').collect();
            inflate(&mut object, &segments, entry.value.clone());
        }
    }
    (!object.is_empty()).then_some(Value::Object(object))
}
