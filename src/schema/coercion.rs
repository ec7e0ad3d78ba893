//! Per-type defaults and value coercion.

use crate::schema::render::{is_falsy, number_to_string};
use crate::schema::types::date::{date_value, now_value, parse_date};
use crate::schema::types::{FieldConfig, FieldType, ObjectId};
use log::{trace, warn};
use serde_json::{Map, Number, Value};

/// Value a field takes when the body does not supply one.
#[must_use]
pub fn default_for(config: &FieldConfig) -> Value {
    match config.field_type {
        FieldType::Boolean => config.default.clone().unwrap_or(Value::Bool(false)),
        FieldType::String => config
            .default
            .clone()
            .unwrap_or_else(|| Value::String(String::new())),
        FieldType::Number => config.default.clone().unwrap_or_else(|| Value::from(0)),
        FieldType::Array => config
            .default
            .clone()
            .unwrap_or_else(|| Value::Array(Vec::new())),
        FieldType::Object => config
            .default
            .clone()
            .unwrap_or_else(|| Value::Object(Map::new())),
        FieldType::Id => config.default.clone().unwrap_or(Value::Null),
        FieldType::Date => match &config.default {
            Some(Value::Null) => Value::Null,
            Some(literal) if !is_falsy(literal) => match parse_date(literal) {
                Some(date) => date_value(date),
                None => {
                    warn!("Unparseable date default {literal}, using null");
                    Value::Null
                }
            },
            _ => now_value(),
        },
    }
}

/// Checks `value` against the declared type, normalising it in place.
///
/// `null` always passes. Coercions: strings `"true"`/`"yes"` and the number
/// `1` become `true` for booleans (other strings and numbers become `false`),
/// numeric strings become numbers, numbers become strings, identifier strings
/// become `$oid` values and parseable dates become `$date` values.
pub fn coerce_and_validate(value: &mut Value, config: &FieldConfig) -> bool {
    if value.is_null() {
        return true;
    }

    match config.field_type {
        FieldType::Boolean => {
            let coerced = match value {
                Value::String(s) => Some(s == "true" || s == "yes"),
                Value::Number(n) => Some(n.as_f64() == Some(1.0)),
                _ => None,
            };
            if let Some(b) = coerced {
                trace!("{b} [boolean]");
                *value = Value::Bool(b);
            }
            value.is_boolean()
        }
        FieldType::Number => {
            if let Value::String(s) = value {
                match parse_number(s) {
                    Some(number) => {
                        trace!("{number} [number]");
                        *value = Value::Number(number);
                    }
                    None => trace!("NaN [string]"),
                }
            }
            value.is_number()
        }
        FieldType::Id => match value {
            Value::String(s) => match ObjectId::parse_str(s) {
                Ok(id) => {
                    *value = id.to_value();
                    true
                }
                Err(e) => {
                    trace!("{e}");
                    false
                }
            },
            other => ObjectId::is_oid_value(other),
        },
        FieldType::Object => value.is_object() || value.is_array(),
        FieldType::String => {
            if let Value::Number(n) = value {
                *value = Value::String(number_to_string(n));
                trace!("{value} [string]");
            }
            match &config.enumeration {
                Some(allowed) => {
                    is_falsy(value)
                        || value
                            .as_str()
                            .is_some_and(|s| allowed.iter().any(|a| a == s))
                }
                None => value.is_string(),
            }
        }
        FieldType::Array => value.is_array(),
        FieldType::Date => match parse_date(value) {
            Some(date) => {
                *value = date_value(date);
                true
            }
            None => false,
        },
    }
}

/// Numeric parse of a string; blank strings read as zero.
fn parse_number(s: &str) -> Option<Number> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Some(Number::from(0));
    }
    if let Ok(i) = trimmed.parse::<i64>() {
        return Some(Number::from(i));
    }
    let f = trimmed.parse::<f64>().ok()?;
    if f.fract() == 0.0 && f.abs() < i64::MAX as f64 {
        return Some(Number::from(f as i64));
    }
    Number::from_f64(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::types::date::is_date_value;
    use serde_json::json;

    fn check(field_type: FieldType, value: Value) -> (bool, Value) {
        let mut value = value;
        let valid = coerce_and_validate(&mut value, &FieldConfig::new(field_type));
        (valid, value)
    }

    #[test]
    fn test_null_always_passes() {
        for field_type in [FieldType::Boolean, FieldType::Number, FieldType::Id, FieldType::Date] {
            assert!(check(field_type, Value::Null).0);
        }
    }

    #[test]
    fn test_boolean_coercion() {
        assert_eq!(check(FieldType::Boolean, json!("yes")), (true, json!(true)));
        assert_eq!(check(FieldType::Boolean, json!("nope")), (true, json!(false)));
        assert_eq!(check(FieldType::Boolean, json!(1)), (true, json!(true)));
        assert_eq!(check(FieldType::Boolean, json!(2)), (true, json!(false)));
        assert!(!check(FieldType::Boolean, json!([true])).0);
    }

    #[test]
    fn test_number_coercion() {
        assert_eq!(check(FieldType::Number, json!("42")), (true, json!(42)));
        assert_eq!(check(FieldType::Number, json!("4.5")), (true, json!(4.5)));
        assert_eq!(check(FieldType::Number, json!("four")), (false, json!("four")));
    }

    #[test]
    fn test_string_coercion_and_enum() {
        assert_eq!(check(FieldType::String, json!(7)), (true, json!("7")));
        assert_eq!(
            check(FieldType::String, json!(1e20)),
            (true, json!("100000000000000000000"))
        );

        let config = FieldConfig::new(FieldType::String).with_enum(["a", "b"]);
        let mut value = json!("c");
        assert!(!coerce_and_validate(&mut value, &config));
        let mut value = json!("a");
        assert!(coerce_and_validate(&mut value, &config));
        let mut value = json!("");
        assert!(coerce_and_validate(&mut value, &config));
    }

    #[test]
    fn test_id_coercion() {
        let (valid, value) = check(FieldType::Id, json!("5f1d7a3b9c0e4a0012345678"));
        assert!(valid);
        assert_eq!(value, json!({"$oid": "5f1d7a3b9c0e4a0012345678"}));
        assert!(!check(FieldType::Id, json!("not-an-id")).0);
        assert!(check(FieldType::Id, value).0);
    }

    #[test]
    fn test_date_coercion() {
        let (valid, value) = check(FieldType::Date, json!("2020-01-01"));
        assert!(valid);
        assert_eq!(value, json!({"$date": "2020-01-01T00:00:00.000Z"}));
        assert!(!check(FieldType::Date, json!("yesterday-ish")).0);
    }

    #[test]
    fn test_array_and_object() {
        assert!(check(FieldType::Array, json!([])).0);
        assert!(!check(FieldType::Array, json!({})).0);
        assert!(check(FieldType::Object, json!({"a": 1})).0);
        assert!(!check(FieldType::Object, json!("a")).0);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(default_for(&FieldConfig::new(FieldType::Boolean)), json!(false));
        assert_eq!(default_for(&FieldConfig::new(FieldType::String)), json!(""));
        assert_eq!(default_for(&FieldConfig::new(FieldType::Number)), json!(0));
        assert_eq!(default_for(&FieldConfig::new(FieldType::Array)), json!([]));
        assert_eq!(default_for(&FieldConfig::new(FieldType::Object)), json!({}));
        assert_eq!(default_for(&FieldConfig::new(FieldType::Id)), Value::Null);
        assert!(is_date_value(&default_for(&FieldConfig::new(FieldType::Date))));
        assert_eq!(
            default_for(&FieldConfig::new(FieldType::Date).with_default(Value::Null)),
            Value::Null
        );
        assert_eq!(
            default_for(&FieldConfig::new(FieldType::Date).with_default(json!("2019-05-05"))),
            json!({"$date": "2019-05-05T00:00:00.000Z"})
        );
        assert_eq!(
            default_for(&FieldConfig::new(FieldType::String).with_default(json!("draft"))),
            json!("draft")
        );
    }
}
