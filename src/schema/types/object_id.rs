//! Storage-native document identifiers.
//!
//! An [`ObjectId`] is twelve bytes: a big-endian unix timestamp in seconds,
//! five random bytes fixed per process and a three byte counter. Inside
//! documents it is written in extended-JSON form, `{"$oid": "<24 hex chars>"}`.

use once_cell::sync::Lazy;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

pub const OID_KEY: &str = "$oid";

static PROCESS_UNIQUE: Lazy<[u8; 5]> = Lazy::new(rand::random::<[u8; 5]>);
static COUNTER: Lazy<AtomicU32> = Lazy::new(|| AtomicU32::new(rand::random::<u32>() & 0x00ff_ffff));

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdError {
    #[error("'{0}' is not a 24 character hex string")]
    Malformed(String),
    #[error("value is not an identifier: {0}")]
    NotAnId(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId([u8; 12]);

impl ObjectId {
    /// Generates a fresh identifier.
    #[must_use]
    pub fn new() -> Self {
        let mut bytes = [0u8; 12];
        let secs = chrono::Utc::now().timestamp() as u32;
        bytes[0..4].copy_from_slice(&secs.to_be_bytes());
        bytes[4..9].copy_from_slice(&*PROCESS_UNIQUE);
        let count = COUNTER.fetch_add(1, Ordering::SeqCst) & 0x00ff_ffff;
        bytes[9..12].copy_from_slice(&count.to_be_bytes()[1..4]);
        Self(bytes)
    }

    #[must_use]
    pub fn from_bytes(bytes: [u8; 12]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn bytes(&self) -> [u8; 12] {
        self.0
    }

    /// Parses a 24 character hex string.
    pub fn parse_str(s: &str) -> Result<Self, IdError> {
        if s.len() != 24 {
            return Err(IdError::Malformed(s.to_string()));
        }
        let mut bytes = [0u8; 12];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| IdError::Malformed(s.to_string()))?;
        Ok(Self(bytes))
    }

    #[must_use]
    pub fn is_valid(s: &str) -> bool {
        Self::parse_str(s).is_ok()
    }

    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Extended-JSON form used inside stored documents.
    #[must_use]
    pub fn to_value(&self) -> Value {
        json!({ OID_KEY: self.to_hex() })
    }

    /// Reads an identifier from either the `$oid` form or a bare hex string.
    pub fn from_value(value: &Value) -> Result<Self, IdError> {
        match value {
            Value::String(s) => Self::parse_str(s),
            Value::Object(map) if map.len() == 1 => match map.get(OID_KEY) {
                Some(Value::String(s)) => Self::parse_str(s),
                _ => Err(IdError::NotAnId(value.to_string())),
            },
            _ => Err(IdError::NotAnId(value.to_string())),
        }
    }

    /// True for values in `$oid` form.
    #[must_use]
    pub fn is_oid_value(value: &Value) -> bool {
        matches!(value, Value::Object(map) if map.len() == 1 && map.contains_key(OID_KEY))
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for ObjectId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_str(s)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique_and_parse_back() {
        let a = ObjectId::new();
        let b = ObjectId::new();
        assert_ne!(a, b);
        assert_eq!(ObjectId::parse_str(&a.to_hex()).unwrap(), a);
    }

    #[test]
    fn test_malformed_ids_are_rejected() {
        assert!(ObjectId::parse_str("abc").is_err());
        assert!(ObjectId::parse_str("zzzzzzzzzzzzzzzzzzzzzzzz").is_err());
        assert!(ObjectId::is_valid("5f1d7a3b9c0e4a0012345678"));
    }

    #[test]
    fn test_value_forms() {
        let id = ObjectId::parse_str("5f1d7a3b9c0e4a0012345678").unwrap();
        let value = id.to_value();
        assert!(ObjectId::is_oid_value(&value));
        assert_eq!(ObjectId::from_value(&value).unwrap(), id);
        assert_eq!(ObjectId::from_value(&json!("5f1d7a3b9c0e4a0012345678")).unwrap(), id);
        assert!(ObjectId::from_value(&json!(12)).is_err());
    }
}
