use crate::permissions::types::policy::{AppRole, Token};
use crate::schema::flatten::flatten_schema;
use crate::schema::types::{Disposition, FlattenedSchema, SchemaDescription, SchemaError};
use log::trace;
use std::collections::HashMap;

/// Read policy of one role over one schema.
///
/// The policy combines:
/// - a default disposition (deny, unless the app role allows everything or
///   the schema role sets `READ`)
/// - per-path overrides from the `__permissions` of schema fields
/// - optional row filters keyed by dotted field path
#[derive(Debug, Clone, Default)]
pub struct PermissionManager {
    default: Disposition,
    overrides: HashMap<String, Disposition>,
    filters: Vec<String>,
}

impl PermissionManager {
    /// Resolves the policy for `token` over `schema`.
    pub fn for_token(
        app_roles: &[AppRole],
        schema: &SchemaDescription,
        token: &Token,
    ) -> Result<Self, SchemaError> {
        let Some(role) = token.role() else {
            return Ok(Self::default());
        };

        let mut default = Disposition::Deny;
        if app_roles.iter().any(|r| r.name == role && r.allows_all()) {
            default = Disposition::Allow;
        }

        let mut filters = Vec::new();
        if let Some(schema_role) = schema.role(role) {
            if let Some(read) = schema_role.data_disposition.as_ref().and_then(|d| d.read) {
                default = read;
            }
            if let Some(filter) = &schema_role.filter {
                filters = filter.keys().cloned().collect();
            }
        }

        let mut overrides = HashMap::new();
        collect_overrides(&flatten_schema(schema)?, role, "", &mut overrides);
        trace!("role {role}: default {default:?}, {} field overrides", overrides.len());

        Ok(Self {
            default,
            overrides,
            filters,
        })
    }

    /// Whether the field at dotted `path` may be read.
    ///
    /// Paths without an override take the default, except that an object
    /// holding an explicitly readable field is itself readable.
    #[must_use]
    pub fn has_read_permission(&self, path: &str) -> bool {
        if let Some(disposition) = self.overrides.get(path) {
            return disposition.is_allowed();
        }
        if self.default.is_allowed() {
            return true;
        }
        let prefix = format!("{path}.");
        self.overrides
            .iter()
            .any(|(p, d)| d.is_allowed() && p.starts_with(&prefix))
    }

    /// Row filter keys declared for the role.
    #[must_use]
    pub fn filters(&self) -> &[String] {
        &self.filters
    }
}

/// Array element fields are keyed by `<array>.<field>`, without an index,
/// since results are walked element by element under the array's path.
fn collect_overrides(
    schema: &FlattenedSchema,
    role: &str,
    prefix: &str,
    overrides: &mut HashMap<String, Disposition>,
) {
    for (path, config) in schema.iter() {
        let full = format!("{prefix}{path}");
        if let Some(permission) = config.permission_for(role) {
            overrides.insert(full.clone(), permission.read);
        }
        if let Some(element_schema) = config.schema.as_ref().filter(|_| config.has_element_schema()) {
            collect_overrides(element_schema, role, &format!("{full}."), overrides);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn schema() -> SchemaDescription {
        serde_json::from_value(json!({
            "name": "contact",
            "collection": "contacts",
            "properties": {
                "name": {"__type": "string", "__permissions": [{"role": "viewer", "READ": "allow"}]},
                "phone": {"mobile": {"__type": "string", "__permissions": [{"role": "viewer", "READ": "allow"}]}},
                "notes": {
                    "__type": "array",
                    "__schema": {"text": {"__type": "string", "__permissions": [{"role": "viewer", "READ": "allow"}]}}
                },
                "secret": {"__type": "string", "__permissions": [{"role": "admin", "READ": "deny"}]}
            },
            "roles": [
                {"name": "viewer", "dataDisposition": {"READ": "deny"}, "filter": {"ownerId": true}},
                {"name": "editor", "dataDisposition": {"READ": "allow"}}
            ]
        }))
        .unwrap()
    }

    #[test]
    fn test_viewer_overrides() {
        let token = Token::new("u1").with_role("viewer");
        let manager = PermissionManager::for_token(&[], &schema(), &token).unwrap();
        assert!(manager.has_read_permission("name"));
        assert!(manager.has_read_permission("phone"));
        assert!(manager.has_read_permission("phone.mobile"));
        assert!(manager.has_read_permission("notes.text"));
        assert!(!manager.has_read_permission("secret"));
        assert!(!manager.has_read_permission("id"));
        assert_eq!(manager.filters(), ["ownerId".to_string()]);
    }

    #[test]
    fn test_default_dispositions() {
        let admin = Token::new("u1").with_role("admin");
        let manager = PermissionManager::for_token(&[], &schema(), &admin).unwrap();
        assert!(!manager.has_read_permission("name"));

        let manager =
            PermissionManager::for_token(&[AppRole::new("admin").allow_all()], &schema(), &admin).unwrap();
        assert!(manager.has_read_permission("name"));
        assert!(!manager.has_read_permission("secret"));

        let editor = Token::new("u1").with_role("editor");
        let manager = PermissionManager::for_token(&[], &schema(), &editor).unwrap();
        assert!(manager.has_read_permission("anything"));
    }
}
