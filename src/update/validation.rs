use crate::schema::coercion::coerce_and_validate;
use crate::schema::flatten::flatten_body;
use crate::schema::render::render_value;
use crate::schema::types::{FieldConfig, FieldType, FlattenedSchema};
use crate::schema::validator::validate_flattened;
use crate::update::path_context::{PathContext, UpdateType};
use log::debug;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// One `{path, value}` partial update as sent by a client.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateRequest {
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default, deserialize_with = "explicit_value")]
    pub value: Option<Value>,
}

// `{"value": null}` is a supplied null, not a missing value.
fn explicit_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl UpdateRequest {
    pub fn new(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: Some(path.into()),
            value: Some(value),
        }
    }

    /// Reads a single request object or an array of them. Entries that are
    /// not request-shaped come back empty and fail validation as missing.
    #[must_use]
    pub fn from_body(body: &Value) -> Vec<UpdateRequest> {
        let parse = |v: &Value| serde_json::from_value(v.clone()).unwrap_or_default();
        match body {
            Value::Array(items) => items.iter().map(parse).collect(),
            item => vec![parse(item)],
        }
    }
}

/// Outcome of validating one update, or the first failing update of a batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateValidation {
    pub is_valid: bool,
    pub is_missing_required: bool,
    pub missing_required: Option<String>,
    pub is_path_valid: bool,
    pub invalid_path: Option<String>,
    pub is_value_valid: bool,
    pub invalid_value: Option<String>,
}

impl UpdateValidation {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            is_missing_required: false,
            missing_required: None,
            is_path_valid: true,
            invalid_path: None,
            is_value_valid: true,
            invalid_value: None,
        }
    }

    fn missing(field: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            is_missing_required: true,
            missing_required: Some(field.into()),
            ..Self::valid()
        }
    }

    fn bad_path(description: String) -> Self {
        Self {
            is_valid: false,
            is_path_valid: false,
            invalid_path: Some(description),
            ..Self::valid()
        }
    }

    fn bad_value(description: String) -> Self {
        Self {
            is_valid: false,
            is_value_valid: false,
            invalid_value: Some(description),
            ..Self::valid()
        }
    }
}

impl Default for UpdateValidation {
    fn default() -> Self {
        Self::valid()
    }
}

impl fmt::Display for UpdateValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(missing) = &self.missing_required {
            write!(f, "missing required field: {missing}")
        } else if let Some(path) = &self.invalid_path {
            write!(f, "invalid path: {path}")
        } else if let Some(value) = &self.invalid_value {
            write!(f, "invalid value: {value}")
        } else {
            write!(f, "valid")
        }
    }
}

/// An update that passed validation, ready for execution.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedUpdate {
    pub path: String,
    /// The value after type coercion.
    pub value: Value,
    pub update_type: UpdateType,
    /// Element schema used to populate `value` before it is written.
    pub element_schema: Option<FlattenedSchema>,
}

impl ValidatedUpdate {
    /// A `$set` that bypasses path matching, for engine-maintained fields.
    pub fn scalar(path: impl Into<String>, value: Value) -> Self {
        Self {
            path: path.into(),
            value,
            update_type: UpdateType::Scalar,
            element_schema: None,
        }
    }
}

/// The schema field a concrete update path lands on.
enum FieldTarget<'a> {
    /// A declared field.
    Field(&'a FieldConfig),
    /// An indexed element of a declared array field.
    Element(&'a FieldConfig),
    /// Nothing declared; base-context paths and removal markers end up here.
    Unknown,
}

fn resolve_target<'a>(schema: &'a FlattenedSchema, path: &str) -> FieldTarget<'a> {
    if let Some(config) = schema.get(path) {
        return FieldTarget::Field(config);
    }

    for (field_path, config) in schema.iter() {
        if config.field_type != FieldType::Array {
            continue;
        }
        let Some(rest) = path
            .strip_prefix(field_path)
            .and_then(|rest| rest.strip_prefix('.'))
        else {
            continue;
        };
        let (index, remainder) = match rest.split_once('.') {
            Some((index, remainder)) => (index, Some(remainder)),
            None => (rest, None),
        };
        if index.parse::<u64>().is_err() {
            continue;
        }
        return match (remainder, &config.schema) {
            (None, _) => FieldTarget::Element(config),
            (Some(remainder), Some(element_schema)) => resolve_target(element_schema, remainder),
            (Some(_), None) => FieldTarget::Unknown,
        };
    }
    FieldTarget::Unknown
}

/// Validates `value` as a whole element document of `schema`.
fn check_element(
    schema: &FlattenedSchema,
    path: &str,
    value: &Value,
) -> Result<(), UpdateValidation> {
    let (result, _) = validate_flattened(schema, flatten_body(value), &format!("{path}."));
    if let Some(missing) = result.missing.first() {
        return Err(UpdateValidation::missing(missing.clone()));
    }
    if let Some(invalid) = result.invalid.first() {
        return Err(UpdateValidation::bad_value(invalid.clone()));
    }
    Ok(())
}

/// Validates one update against a path context and a flattened schema.
pub fn check_update(
    context: &PathContext,
    schema: &FlattenedSchema,
    request: &UpdateRequest,
) -> Result<ValidatedUpdate, UpdateValidation> {
    let path = match request.path.as_deref() {
        Some(path) if !path.is_empty() => path,
        _ => return Err(UpdateValidation::missing("path")),
    };
    let Some(value) = request.value.as_ref() else {
        return Err(UpdateValidation::missing("value"));
    };

    let Some((spec, _)) = context.find_match(path) else {
        let patterns: Vec<&str> = context.patterns().collect();
        debug!("No update path matches {path}");
        return Err(UpdateValidation::bad_path(format!("{path} <> {}", patterns.join(","))));
    };

    if !spec.allows(value) {
        let allowed: Vec<String> = spec.values.iter().map(render_value).collect();
        return Err(UpdateValidation::bad_value(format!(
            "{} <> {}",
            render_value(value),
            allowed.join(",")
        )));
    }

    let mut value = value.clone();
    let mut element_schema = None;
    match resolve_target(schema, path) {
        FieldTarget::Field(config) if config.field_type == FieldType::Array => {
            // The bare array path appends one element.
            if let Some(sub) = &config.schema {
                check_element(sub, path, &value)?;
                element_schema = Some(sub.clone());
            }
        }
        FieldTarget::Field(config) => {
            if !coerce_and_validate(&mut value, config) {
                return Err(UpdateValidation::bad_value(format!("{path} failed schema test")));
            }
        }
        FieldTarget::Element(config) => {
            if let Some(sub) = &config.schema {
                check_element(sub, path, &value)?;
                element_schema = Some(sub.clone());
            }
        }
        FieldTarget::Unknown => {}
    }

    debug!("Update {path} validated as {}", spec.update_type);
    Ok(ValidatedUpdate {
        path: path.to_string(),
        value,
        update_type: spec.update_type,
        element_schema,
    })
}

/// Validates every request; the first failure wins.
pub fn check_updates(
    context: &PathContext,
    schema: &FlattenedSchema,
    requests: &[UpdateRequest],
) -> Result<Vec<ValidatedUpdate>, UpdateValidation> {
    requests
        .iter()
        .map(|request| check_update(context, schema, request))
        .collect()
}

/// [`check_updates`] reduced to its validation outcome.
#[must_use]
pub fn validate_requests(
    context: &PathContext,
    schema: &FlattenedSchema,
    requests: &[UpdateRequest],
) -> UpdateValidation {
    match check_updates(context, schema, requests) {
        Ok(_) => UpdateValidation::valid(),
        Err(failure) => failure,
    }
}
