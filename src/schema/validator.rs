use crate::schema::coercion::{coerce_and_validate, default_for};
use crate::schema::flatten::{flatten_body, resolve_body_value};
use crate::schema::render::{render_value, type_name};
use crate::schema::types::{BodyEntry, FlattenedBody, FlattenedSchema};
use log::{trace, warn};
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Outcome of validating a whole document against a schema.
///
/// `missing` lists required paths absent from the body; `invalid` holds
/// `<path>:<value>[<type>]` descriptors for values that failed their type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub missing: Vec<String>,
    pub invalid: Vec<String>,
}

impl ValidationResult {
    #[must_use]
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            missing: Vec::new(),
            invalid: Vec::new(),
        }
    }

    /// First offending path, missing fields before invalid ones.
    #[must_use]
    pub fn first_error(&self) -> Option<&str> {
        self.missing
            .first()
            .or_else(|| self.invalid.first())
            .map(String::as_str)
    }

    fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.missing.extend(other.missing);
        self.invalid.extend(other.invalid);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::valid()
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid {
            return write!(f, "valid");
        }
        if !self.missing.is_empty() {
            write!(f, "missing field(s): {}", self.missing.join(", "))?;
            if !self.invalid.is_empty() {
                write!(f, "; ")?;
            }
        }
        if !self.invalid.is_empty() {
            write!(f, "invalid field(s): {}", self.invalid.join(", "))?;
        }
        Ok(())
    }
}

/// Validates a flattened body against a flattened schema.
///
/// Every non-required field the body lacks is filled with its default, and
/// every checked value is left in its coerced form; the returned body carries
/// those additions so a following population sees the same values. Array
/// fields with an element schema are validated element by element with the
/// `<prefix><path>.<index>.` prefix.
#[must_use]
pub fn validate_flattened(
    schema: &FlattenedSchema,
    mut body: FlattenedBody,
    prefix: &str,
) -> (ValidationResult, FlattenedBody) {
    let mut result = ValidationResult::valid();

    for (path, config) in schema.iter() {
        let index = match body.iter().position(|e| e.path == path) {
            Some(index) => index,
            None => {
                let value = match resolve_body_value(path, config, &body) {
                    Some(value) => value,
                    None if config.required => {
                        warn!("Missing required {prefix}{path}");
                        result.is_valid = false;
                        result.missing.push(format!("{prefix}{path}"));
                        continue;
                    }
                    None => default_for(config),
                };
                body.push(BodyEntry::new(path, value));
                body.len() - 1
            }
        };

        let value = &mut body[index].value;
        if !coerce_and_validate(value, config) {
            warn!("Invalid {prefix}{path}: {} [{}]", render_value(value), type_name(value));
            result.is_valid = false;
            result.invalid.push(format!(
                "{prefix}{path}:{}[{}]",
                render_value(value),
                type_name(value)
            ));
            continue;
        }

        if !config.has_element_schema() {
            continue;
        }
        if let (Some(element_schema), Value::Array(items)) = (&config.schema, &*value) {
            for (i, item) in items.iter().enumerate() {
                let (element, _) = validate_flattened(
                    element_schema,
                    flatten_body(item),
                    &format!("{prefix}{path}.{i}."),
                );
                result.merge(element);
            }
        }
    }

    trace!("missing: {:?}", result.missing);
    trace!("invalid: {:?}", result.invalid);
    (result, body)
}

/// Validates one document, or each document of an array.
///
/// For arrays the first failing document's result is returned; later
/// documents are still checked but their failures are not reported.
#[must_use]
pub fn validate_body(schema: &FlattenedSchema, body: &Value) -> ValidationResult {
    match body {
        Value::Array(documents) => documents
            .iter()
            .map(|document| validate_document(schema, document))
            .find(|result| !result.is_valid)
            .unwrap_or_else(ValidationResult::valid),
        document => validate_document(schema, document),
    }
}

fn validate_document(schema: &FlattenedSchema, document: &Value) -> ValidationResult {
    validate_flattened(schema, flatten_body(document), "").0
}
