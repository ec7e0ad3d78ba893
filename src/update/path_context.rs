//! Allowed update paths, as an ordered list of anchored patterns.

use crate::schema::types::{FieldType, FlattenedSchema, SchemaError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Pattern matching an array index segment.
pub const INDEX_PATTERN: &str = "([0-9]{1,11})";
/// Final segment marking an indexed element for removal.
pub const REMOVE_SEGMENT: &str = "__remove__";

/// How a matched path is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateType {
    /// `$set` on the exact path.
    Scalar,
    /// `$push` onto the array at the path.
    VectorAdd,
    /// Removal of an indexed array element.
    VectorRm,
}

impl fmt::Display for UpdateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateType::Scalar => "scalar",
            UpdateType::VectorAdd => "vector-add",
            UpdateType::VectorRm => "vector-rm",
        };
        f.write_str(name)
    }
}

/// One allowed path pattern and the literal values it accepts
/// (an empty list accepts anything).
#[derive(Debug, Clone)]
pub struct PathSpec {
    pattern: String,
    regex: Regex,
    pub update_type: UpdateType,
    pub values: Vec<Value>,
}

impl PathSpec {
    pub fn new(
        pattern: impl Into<String>,
        update_type: UpdateType,
        values: Vec<Value>,
    ) -> Result<Self, SchemaError> {
        let pattern = pattern.into();
        let regex = Regex::new(&pattern)
            .map_err(|e| SchemaError::InvalidPattern(format!("{pattern}: {e}")))?;
        Ok(Self {
            pattern,
            regex,
            update_type,
            values,
        })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Captured groups (array indices) when `path` matches.
    #[must_use]
    pub fn captures(&self, path: &str) -> Option<Vec<String>> {
        self.regex.captures(path).map(|caps| {
            caps.iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect()
        })
    }

    /// Whether `value` passes this spec's literal allowlist.
    #[must_use]
    pub fn allows(&self, value: &Value) -> bool {
        value.is_null() || self.values.is_empty() || self.values.contains(value)
    }
}

impl PartialEq for PathSpec {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
            && self.update_type == other.update_type
            && self.values == other.values
    }
}

/// Ordered path specs; the first matching spec decides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathContext {
    specs: Vec<PathSpec>,
}

impl PathContext {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a spec. A pattern that is already present keeps its position
    /// and takes the new type and values.
    pub fn insert(
        &mut self,
        pattern: impl Into<String>,
        update_type: UpdateType,
        values: Vec<Value>,
    ) -> Result<(), SchemaError> {
        let spec = PathSpec::new(pattern, update_type, values)?;
        self.push_spec(spec);
        Ok(())
    }

    /// Builder form of [`PathContext::insert`].
    pub fn with(
        mut self,
        pattern: impl Into<String>,
        update_type: UpdateType,
        values: Vec<Value>,
    ) -> Result<Self, SchemaError> {
        self.insert(pattern, update_type, values)?;
        Ok(self)
    }

    fn push_spec(&mut self, spec: PathSpec) {
        match self.specs.iter_mut().find(|s| s.pattern == spec.pattern) {
            Some(existing) => *existing = spec,
            None => self.specs.push(spec),
        }
    }

    #[must_use]
    pub fn contains(&self, pattern: &str) -> bool {
        self.specs.iter().any(|s| s.pattern == pattern)
    }

    #[must_use]
    pub fn get(&self, pattern: &str) -> Option<&PathSpec> {
        self.specs.iter().find(|s| s.pattern == pattern)
    }

    /// First spec matching `path`, with its captured indices.
    #[must_use]
    pub fn find_match(&self, path: &str) -> Option<(&PathSpec, Vec<String>)> {
        self.specs
            .iter()
            .find_map(|spec| spec.captures(path).map(|params| (spec, params)))
    }

    pub fn specs(&self) -> impl Iterator<Item = &PathSpec> {
        self.specs.iter()
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|s| s.pattern.as_str())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Layers the paths derived from `schema` under the caller's `base` context.
///
/// Base specs come first and win on identical patterns. Per field:
/// scalars (and strings, with their `__enum` as allowlist) get one `scalar`
/// pattern; arrays get `vector-add` on the bare path, `vector-rm` on
/// `<path>.<index>.__remove__` and `scalar` on `<path>.<index>`, followed by
/// the patterns of their element schema. Fields with `__allowUpdate: false`
/// get nothing.
pub fn extend_path_context(
    base: &PathContext,
    schema: &FlattenedSchema,
    prefix: &str,
) -> Result<PathContext, SchemaError> {
    let mut derived = PathContext::new();
    derive_specs(&mut derived, schema, prefix)?;

    let mut extended = base.clone();
    for spec in derived.specs {
        if !extended.contains(&spec.pattern) {
            extended.specs.push(spec);
        }
    }
    Ok(extended)
}

fn derive_specs(
    context: &mut PathContext,
    schema: &FlattenedSchema,
    prefix: &str,
) -> Result<(), SchemaError> {
    for (property, config) in schema.iter() {
        if !config.allow_update {
            continue;
        }
        let field = format!("{prefix}{}", regex::escape(property));

        match config.field_type {
            FieldType::String => {
                let values = config
                    .enumeration
                    .as_ref()
                    .map(|e| e.iter().cloned().map(Value::String).collect())
                    .unwrap_or_default();
                context.insert(format!("^{field}$"), UpdateType::Scalar, values)?;
            }
            FieldType::Array => {
                context.insert(format!("^{field}$"), UpdateType::VectorAdd, Vec::new())?;
                context.insert(
                    format!("^{field}\\.{INDEX_PATTERN}\\.{REMOVE_SEGMENT}$"),
                    UpdateType::VectorRm,
                    Vec::new(),
                )?;
                context.insert(
                    format!("^{field}\\.{INDEX_PATTERN}$"),
                    UpdateType::Scalar,
                    Vec::new(),
                )?;
                if let Some(element_schema) = &config.schema {
                    derive_specs(context, element_schema, &format!("{field}\\.{INDEX_PATTERN}\\."))?;
                }
            }
            FieldType::Boolean
            | FieldType::Number
            | FieldType::Object
            | FieldType::Id
            | FieldType::Date => {
                context.insert(format!("^{field}$"), UpdateType::Scalar, Vec::new())?;
            }
        }
    }
    Ok(())
}
