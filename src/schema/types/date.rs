//! Date values as stored inside documents: `{"$date": "<RFC 3339>"}`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde_json::{json, Value};

pub const DATE_KEY: &str = "$date";

/// Extended-JSON form of `date`.
#[must_use]
pub fn date_value(date: DateTime<Utc>) -> Value {
    json!({ DATE_KEY: date.to_rfc3339_opts(SecondsFormat::Millis, true) })
}

#[must_use]
pub fn now_value() -> Value {
    date_value(Utc::now())
}

#[must_use]
pub fn is_date_value(value: &Value) -> bool {
    matches!(value, Value::Object(map) if map.len() == 1 && map.contains_key(DATE_KEY))
}

/// Parses anything a client may reasonably send as a date.
///
/// Accepts the `$date` form, RFC 3339, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`,
/// the literal `now` and epoch milliseconds. Strings without an offset are
/// read as UTC.
#[must_use]
pub fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => parse_date_str(s),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        Value::Object(map) if map.len() == 1 => map.get(DATE_KEY).and_then(parse_date),
        _ => None,
    }
}

fn parse_date_str(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Some(Utc::now());
    }
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Some(date.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepted_forms() {
        let expected = Utc.with_ymd_and_hms(2020, 3, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_date(&json!("2020-03-01")), Some(expected));
        assert_eq!(parse_date(&json!("2020-03-01T00:00:00Z")), Some(expected));
        assert_eq!(parse_date(&json!("2020-03-01 00:00:00")), Some(expected));
        assert_eq!(parse_date(&json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(parse_date(&date_value(expected)), Some(expected));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_date(&json!("not a date")), None);
        assert_eq!(parse_date(&json!(true)), None);
        assert_eq!(parse_date(&json!({"when": "2020-03-01"})), None);
    }

    #[test]
    fn test_date_value_shape() {
        let value = date_value(Utc.with_ymd_and_hms(2021, 1, 2, 3, 4, 5).unwrap());
        assert!(is_date_value(&value));
        assert_eq!(value, json!({"$date": "2021-01-02T03:04:05.000Z"}));
    }
}
