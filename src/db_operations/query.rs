//! Document queries and projections over JSON documents.

use crate::db_operations::error::CollectionError;
use crate::schema::types::ObjectId;
use serde_json::{Map, Value};

const IN_OPERATOR: &str = "$in";

/// Looks up a dotted path; numeric segments index into arrays.
#[must_use]
pub fn get_path<'a>(document: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(document, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// One condition on a path.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// Equal to the stored value, or contained when the stored value is an array.
    Equals(Value),
    /// Any of the listed values, under the same rule.
    In(Vec<Value>),
}

impl Condition {
    fn matches(&self, stored: Option<&Value>) -> bool {
        match self {
            Condition::Equals(expected) => value_matches(stored, expected),
            Condition::In(candidates) => candidates.iter().any(|c| value_matches(stored, c)),
        }
    }
}

fn value_matches(stored: Option<&Value>, expected: &Value) -> bool {
    match stored {
        None => expected.is_null(),
        Some(Value::Array(items)) if !expected.is_array() => items.contains(expected),
        Some(stored) => stored == expected,
    }
}

/// Conjunction of path conditions. The empty query matches every document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentQuery {
    conditions: Vec<(String, Condition)>,
}

impl DocumentQuery {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn by_id(id: &ObjectId) -> Self {
        Self::all().eq("_id", id.to_value())
    }

    #[must_use]
    pub fn by_ids(ids: &[ObjectId]) -> Self {
        Self::all().is_in("_id", ids.iter().map(ObjectId::to_value).collect())
    }

    #[must_use]
    pub fn eq(mut self, path: impl Into<String>, value: Value) -> Self {
        self.conditions.push((path.into(), Condition::Equals(value)));
        self
    }

    #[must_use]
    pub fn is_in(mut self, path: impl Into<String>, values: Vec<Value>) -> Self {
        self.conditions.push((path.into(), Condition::In(values)));
        self
    }

    /// Reads a query document such as `{"ownerId": {"$oid": ".."},
    /// "status": {"$in": ["open", "held"]}}`.
    pub fn from_value(query: &Value) -> Result<Self, CollectionError> {
        let map = match query {
            Value::Null => return Ok(Self::all()),
            Value::Object(map) => map,
            other => {
                return Err(CollectionError::InvalidQuery(format!(
                    "query must be an object, got {other}"
                )))
            }
        };

        let mut parsed = Self::all();
        for (path, condition) in map {
            parsed = match condition.get(IN_OPERATOR) {
                Some(Value::Array(values)) => parsed.is_in(path.clone(), values.clone()),
                Some(other) => {
                    return Err(CollectionError::InvalidQuery(format!(
                        "{path}: $in expects an array, got {other}"
                    )))
                }
                None => parsed.eq(path.clone(), condition.clone()),
            };
        }
        Ok(parsed)
    }

    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(path, condition)| condition.matches(get_path(document, path)))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

/// Top-level keys to leave out of returned documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    excluded: Vec<String>,
}

impl Projection {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn exclude(mut self, key: impl Into<String>) -> Self {
        self.excluded.push(key.into());
        self
    }

    /// Reads `{"key": 0, ...}`; keys with a truthy value are ignored since
    /// inclusive projections are not supported.
    #[must_use]
    pub fn from_value(projection: &Value) -> Self {
        let excluded = projection
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(_, v)| v.as_i64() == Some(0) || v.as_bool() == Some(false))
                    .map(|(k, _)| k.clone())
                    .collect()
            })
            .unwrap_or_default();
        Self { excluded }
    }

    pub fn apply(&self, document: &mut Value) {
        if let Value::Object(map) = document {
            strip_keys(map, &self.excluded);
        }
    }
}

fn strip_keys(map: &mut Map<String, Value>, keys: &[String]) {
    for key in keys {
        map.remove(key);
    }
}
