use crate::schema::types::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// App-level data disposition granting read access to every field.
pub const ALLOW_ALL: &str = "allowAll";

/// The authenticated caller a result is projected for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Plain string, or the hex form of an `$oid` user id.
    #[serde(rename = "_user", alias = "userId", deserialize_with = "user_id")]
    pub user_id: String,
}

fn user_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(id) => Ok(id),
        other => ObjectId::from_value(&other)
            .map(|id| id.to_hex())
            .map_err(serde::de::Error::custom),
    }
}

impl Token {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            role: None,
            user_id: user_id.into(),
        }
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// The role name, if one is set and non-empty.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref().filter(|r| !r.is_empty())
    }
}

/// An application-wide role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRole {
    pub name: String,
    #[serde(rename = "dataDisposition", default, skip_serializing_if = "Option::is_none")]
    pub data_disposition: Option<String>,
}

impl AppRole {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_disposition: None,
        }
    }

    #[must_use]
    pub fn allow_all(mut self) -> Self {
        self.data_disposition = Some(ALLOW_ALL.to_string());
        self
    }

    #[must_use]
    pub fn allows_all(&self) -> bool {
        self.data_disposition.as_deref() == Some(ALLOW_ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_token_parses_user_field() {
        let token: Token = serde_json::from_value(json!({"role": "viewer", "_user": "u1"})).unwrap();
        assert_eq!(token.role(), Some("viewer"));
        assert_eq!(token.user_id, "u1");

        let token: Token = serde_json::from_value(json!({"role": "", "userId": "u2"})).unwrap();
        assert_eq!(token.role(), None);
    }

    #[test]
    fn test_token_accepts_oid_user() {
        let token: Token = serde_json::from_value(
            json!({"role": "member", "_user": {"$oid": "5f1d7a3b9c0e4a0012345678"}}),
        )
        .unwrap();
        assert_eq!(token.user_id, "5f1d7a3b9c0e4a0012345678");

        assert!(serde_json::from_value::<Token>(json!({"_user": 42})).is_err());
    }

    #[test]
    fn test_app_role_disposition() {
        let role: AppRole = serde_json::from_value(json!({"name": "admin", "dataDisposition": "allowAll"})).unwrap();
        assert!(role.allows_all());
        assert!(!AppRole::new("user").allows_all());
    }
}
