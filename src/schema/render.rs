//! Client-facing renderings of values inside validation messages.
//!
//! Messages follow the format existing API clients parse, which uses script
//! style type names (`string`, `number`, `boolean`, `object`) and string
//! conversions.

use crate::schema::types::date::DATE_KEY;
use crate::schema::types::object_id::OID_KEY;
use serde_json::{Number, Value};

/// Type name of `value`; `null`, arrays and maps are all `object`.
#[must_use]
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Null | Value::Array(_) | Value::Object(_) => "object",
    }
}

/// String conversion of `value` as used in `path:value[type]` descriptors.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|v| match v {
                Value::Null => String::new(),
                other => render_value(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        Value::Object(map) => {
            if map.len() == 1 {
                for key in [OID_KEY, DATE_KEY] {
                    if let Some(Value::String(inner)) = map.get(key) {
                        return inner.clone();
                    }
                }
            }
            "[object Object]".to_string()
        }
    }
}

/// Integral numbers render without a fractional part.
#[must_use]
pub fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f == 0.0 => "0".to_string(),
        Some(f) if f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

/// Falsy values: `null`, `false`, `0` and the empty string.
#[must_use]
pub fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&json!(null)), "object");
        assert_eq!(type_name(&json!([1])), "object");
        assert_eq!(type_name(&json!("a")), "string");
        assert_eq!(type_name(&json!(1.5)), "number");
    }

    #[test]
    fn test_render_values() {
        assert_eq!(render_value(&json!(["a", 1, null])), "a,1,");
        assert_eq!(render_value(&json!({"a": 1})), "[object Object]");
        assert_eq!(render_value(&json!({"$oid": "5f1d7a3b9c0e4a0012345678"})), "5f1d7a3b9c0e4a0012345678");
        assert_eq!(render_value(&json!(2.0)), "2");
        assert_eq!(render_value(&json!(2.5)), "2.5");
    }

    #[test]
    fn test_large_integral_floats_keep_their_digits() {
        let render = |f: f64| number_to_string(&Number::from_f64(f).unwrap());
        assert_eq!(render(1e20), "100000000000000000000");
        assert_eq!(render(-9.3e18), "-9300000000000000000");
        assert_eq!(render(2.5), "2.5");
        assert_eq!(render(-0.0), "0");
    }

    #[test]
    fn test_falsy() {
        assert!(is_falsy(&json!("")));
        assert!(is_falsy(&json!(0)));
        assert!(!is_falsy(&json!("c")));
        assert!(!is_falsy(&json!({})));
    }
}
