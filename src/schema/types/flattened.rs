use crate::schema::types::FieldConfig;
use serde::Serialize;
use serde_json::Value;

/// Leaf fields of a schema keyed by dotted path, in declaration order.
///
/// Every leaf path appears exactly once; intermediate objects never do.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FlattenedSchema {
    fields: Vec<(String, FieldConfig)>,
}

impl FlattenedSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a leaf. A repeated path replaces the earlier config in place.
    pub fn insert(&mut self, path: String, config: FieldConfig) {
        match self.fields.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = config,
            None => self.fields.push((path, config)),
        }
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&FieldConfig> {
        self.fields.iter().find(|(p, _)| p == path).map(|(_, c)| c)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldConfig)> {
        self.fields.iter().map(|(p, c)| (p.as_str(), c))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(p, _)| p.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// One `{path, value}` pair of a flattened body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyEntry {
    pub path: String,
    pub value: Value,
}

impl BodyEntry {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
        }
    }
}

/// Ordered leaf values of a request body.
pub type FlattenedBody = Vec<BodyEntry>;
