//! Bulk write operations and their effect on a stored document.

use crate::db_operations::error::CollectionError;
use crate::schema::types::ObjectId;
use serde_json::{json, Map, Value};
use std::fmt;

/// Field-level update applied to one document, keyed by dotted path.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperator {
    Set { path: String, value: Value },
    Push { path: String, value: Value },
    Unset { path: String },
    Pull { path: String, value: Value },
}

impl UpdateOperator {
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            UpdateOperator::Set { path, .. }
            | UpdateOperator::Push { path, .. }
            | UpdateOperator::Unset { path }
            | UpdateOperator::Pull { path, .. } => path,
        }
    }

    /// Document-store form, e.g. `{"$set": {"title": "T"}}`.
    #[must_use]
    pub fn to_document(&self) -> Value {
        match self {
            UpdateOperator::Set { path, value } => json!({"$set": {path.clone(): value}}),
            UpdateOperator::Push { path, value } => json!({"$push": {path.clone(): value}}),
            UpdateOperator::Unset { path } => json!({"$unset": {path.clone(): ""}}),
            UpdateOperator::Pull { path, value } => json!({"$pull": {path.clone(): value}}),
        }
    }

    /// Applies the operator to `document`, returning whether it changed.
    pub fn apply(&self, document: &mut Value) -> Result<bool, CollectionError> {
        let segments: Vec<&str> = self.path().split('.').collect();
        match self {
            UpdateOperator::Set { value, .. } => {
                let slot = slot_mut(document, &segments, true)?.ok_or_else(|| {
                    CollectionError::InvalidOperation(format!("Cannot set {}", self.path()))
                })?;
                let changed = *slot != *value;
                *slot = value.clone();
                Ok(changed)
            }
            UpdateOperator::Push { path, value } => {
                let slot = slot_mut(document, &segments, true)?.ok_or_else(|| {
                    CollectionError::InvalidOperation(format!("Cannot push to {path}"))
                })?;
                match slot {
                    Value::Null => {
                        *slot = Value::Array(vec![value.clone()]);
                        Ok(true)
                    }
                    Value::Array(items) => {
                        items.push(value.clone());
                        Ok(true)
                    }
                    other => Err(CollectionError::InvalidOperation(format!(
                        "The field '{path}' must be an array but is of type {}",
                        json_kind(other)
                    ))),
                }
            }
            UpdateOperator::Unset { .. } => {
                let Some((last, parents)) = segments.split_last() else {
                    return Ok(false);
                };
                let Some(parent) = slot_mut(document, parents, false)? else {
                    return Ok(false);
                };
                match parent {
                    Value::Object(map) => Ok(map.remove(*last).is_some()),
                    // Array elements are blanked, never shifted.
                    Value::Array(items) => match last.parse::<usize>().ok().and_then(|i| items.get_mut(i)) {
                        Some(item) => {
                            let changed = !item.is_null();
                            *item = Value::Null;
                            Ok(changed)
                        }
                        None => Ok(false),
                    },
                    _ => Ok(false),
                }
            }
            UpdateOperator::Pull { path, value } => match slot_mut(document, &segments, false)? {
                None | Some(Value::Null) => Ok(false),
                Some(Value::Array(items)) => {
                    let before = items.len();
                    items.retain(|item| item != value);
                    Ok(items.len() != before)
                }
                Some(other) => Err(CollectionError::InvalidOperation(format!(
                    "Cannot apply $pull to a non-array value at '{path}' ({})",
                    json_kind(other)
                ))),
            },
        }
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Most `null` slots a write may add in front of a new array element.
pub const MAX_ARRAY_PADDING: usize = 1_000;

/// Walks to the value at `segments`. With `create`, missing object keys are
/// inserted as `null` (intermediates as objects) and short arrays are padded
/// with `null` up to [`MAX_ARRAY_PADDING`] slots; without it, a missing
/// segment yields `None`.
fn slot_mut<'a>(
    document: &'a mut Value,
    segments: &[&str],
    create: bool,
) -> Result<Option<&'a mut Value>, CollectionError> {
    let mut current = document;
    for (depth, segment) in segments.iter().enumerate() {
        let is_last = depth + 1 == segments.len();
        if create && current.is_null() {
            *current = Value::Object(Map::new());
        }
        current = match current {
            Value::Object(map) => {
                if !map.contains_key(*segment) {
                    if !create {
                        return Ok(None);
                    }
                    let fresh = if is_last { Value::Null } else { Value::Object(Map::new()) };
                    map.insert((*segment).to_string(), fresh);
                }
                match map.get_mut(*segment) {
                    Some(next) => next,
                    None => return Ok(None),
                }
            }
            Value::Array(items) => {
                let index = segment.parse::<usize>().map_err(|_| {
                    CollectionError::InvalidOperation(format!(
                        "Cannot use the part ({segment}) to traverse an array"
                    ))
                })?;
                if index >= items.len() {
                    if !create {
                        return Ok(None);
                    }
                    if index - items.len() > MAX_ARRAY_PADDING {
                        return Err(CollectionError::InvalidOperation(format!(
                            "Index {index} is too far past the end of an array of length {}",
                            items.len()
                        )));
                    }
                    items.resize(index + 1, Value::Null);
                }
                &mut items[index]
            }
            other => {
                return Err(CollectionError::InvalidOperation(format!(
                    "Cannot create field '{segment}' in element of type {}",
                    json_kind(other)
                )))
            }
        };
    }
    Ok(Some(current))
}

/// One entry of a bulk write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    InsertOne { document: Value },
    UpdateOne { filter: ObjectId, update: UpdateOperator },
}

impl WriteOp {
    #[must_use]
    pub fn insert(document: Value) -> Self {
        WriteOp::InsertOne { document }
    }

    #[must_use]
    pub fn update(filter: ObjectId, update: UpdateOperator) -> Self {
        WriteOp::UpdateOne { filter, update }
    }
}

/// Outcome of a bulk write.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkWriteResult {
    pub inserted_ids: Vec<ObjectId>,
    pub matched_count: u64,
    pub modified_count: u64,
}
