use crate::schema::types::field::Disposition;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const TIMESTAMPS_EXTENSION: &str = "timestamps";

/// Declarative definition of one resource collection.
///
/// `properties` is kept as the raw JSON tree: a node whose keys all start
/// with `__` is a leaf field, anything else is a nested object. Use
/// [`crate::schema::flatten_schema`] to turn it into per-path configs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub name: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<String>,
    #[serde(alias = "collectionName")]
    pub collection: String,
    #[serde(default)]
    pub extends: Vec<String>,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<SchemaRole>,
}

impl SchemaDescription {
    pub fn new(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema_type: Some("collection".to_string()),
            collection: collection.into(),
            extends: Vec::new(),
            properties: Map::new(),
            roles: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_properties(mut self, properties: Map<String, Value>) -> Self {
        self.properties = properties;
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: Vec<SchemaRole>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extends.push(extension.into());
        self
    }

    /// Whether `createdAt`/`updatedAt` are maintained for this collection.
    #[must_use]
    pub fn has_timestamps(&self) -> bool {
        self.extends.iter().any(|e| e == TIMESTAMPS_EXTENSION)
    }

    #[must_use]
    pub fn role(&self, name: &str) -> Option<&SchemaRole> {
        self.roles.iter().find(|r| r.name == name)
    }
}

/// Schema-level visibility policy for one role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRole {
    pub name: String,
    #[serde(rename = "dataDisposition", default, skip_serializing_if = "Option::is_none")]
    pub data_disposition: Option<RoleDisposition>,
    /// Dotted field path -> marker; rows are kept only when the value at that
    /// path equals (or contains) the caller's user id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Map<String, Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoleDisposition {
    #[serde(rename = "READ", default, skip_serializing_if = "Option::is_none")]
    pub read: Option<Disposition>,
}
