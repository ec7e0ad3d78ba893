use crate::schema::types::flattened::FlattenedSchema;
use crate::schema::types::SchemaError;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Declared type of a leaf field.
///
/// A leaf without `__type` is treated as a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    #[default]
    Boolean,
    String,
    Number,
    Array,
    Object,
    Id,
    Date,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Boolean => "boolean",
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Array => "array",
            FieldType::Object => "object",
            FieldType::Id => "id",
            FieldType::Date => "date",
        };
        f.write_str(name)
    }
}

/// Read policy for a field or a whole row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Disposition {
    Allow,
    #[default]
    Deny,
}

impl Disposition {
    #[must_use]
    pub fn is_allowed(self) -> bool {
        self == Disposition::Allow
    }
}

/// Per-role read override attached to a leaf field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPermission {
    pub role: String,
    #[serde(rename = "READ", default)]
    pub read: Disposition,
}

/// Metadata of one leaf node of a schema description.
///
/// `schema` is the flattened form of the leaf's `__schema` tree; it is only
/// filled in by flattening and is only meaningful for array fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldConfig {
    #[serde(rename = "__type", default)]
    pub field_type: FieldType,
    #[serde(
        rename = "__default",
        default,
        deserialize_with = "explicit_value",
        skip_serializing_if = "Option::is_none"
    )]
    pub default: Option<Value>,
    #[serde(rename = "__required", default)]
    pub required: bool,
    #[serde(rename = "__allowUpdate", default = "default_allow_update")]
    pub allow_update: bool,
    #[serde(rename = "__enum", default, skip_serializing_if = "Option::is_none")]
    pub enumeration: Option<Vec<String>>,
    #[serde(rename = "__permissions", default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<FieldPermission>,
    #[serde(skip)]
    pub schema: Option<FlattenedSchema>,
}

fn default_allow_update() -> bool {
    true
}

// Keeps an explicit `null` apart from a missing key.
fn explicit_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl FieldConfig {
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            default: None,
            required: false,
            allow_update: true,
            enumeration: None,
            permissions: Vec::new(),
            schema: None,
        }
    }

    /// Parses the metadata keys of a leaf node. `path` is only used in errors.
    pub fn from_leaf(path: &str, node: &Map<String, Value>) -> Result<Self, SchemaError> {
        serde_json::from_value(Value::Object(node.clone()))
            .map_err(|e| SchemaError::InvalidField(format!("{path}: {e}")))
    }

    #[must_use]
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_enum<S: Into<String>>(mut self, values: impl IntoIterator<Item = S>) -> Self {
        self.enumeration = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// True for array fields whose elements follow a sub-schema.
    #[must_use]
    pub fn has_element_schema(&self) -> bool {
        self.field_type == FieldType::Array && self.schema.is_some()
    }

    /// The override for `role`, if this field declares one.
    #[must_use]
    pub fn permission_for(&self, role: &str) -> Option<&FieldPermission> {
        self.permissions.iter().find(|p| p.role == role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_leaf_defaults() {
        let config = FieldConfig::from_leaf("flag", &leaf(json!({}))).unwrap();
        assert_eq!(config.field_type, FieldType::Boolean);
        assert!(config.allow_update);
        assert!(!config.required);
        assert_eq!(config.default, None);
    }

    #[test]
    fn test_explicit_null_default_is_kept() {
        let config =
            FieldConfig::from_leaf("due", &leaf(json!({"__type": "date", "__default": null})))
                .unwrap();
        assert_eq!(config.default, Some(Value::Null));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let err = FieldConfig::from_leaf("x", &leaf(json!({"__type": "float"}))).unwrap_err();
        assert!(matches!(err, SchemaError::InvalidField(msg) if msg.starts_with("x:")));
    }

    #[test]
    fn test_permissions_parse() {
        let config = FieldConfig::from_leaf(
            "name",
            &leaf(json!({
                "__type": "string",
                "__permissions": [{"role": "viewer", "READ": "allow"}, {"role": "guest"}]
            })),
        )
        .unwrap();
        assert_eq!(config.permission_for("viewer").unwrap().read, Disposition::Allow);
        assert_eq!(config.permission_for("guest").unwrap().read, Disposition::Deny);
        assert!(config.permission_for("admin").is_none());
    }
}
