use crate::error::{ButtressError, ButtressResult};
use crate::permissions::permission_manager::PermissionManager;
use crate::permissions::types::policy::{AppRole, Token};
use crate::schema::types::date::DATE_KEY;
use crate::schema::types::object_id::OID_KEY;
use crate::schema::types::{ObjectId, SchemaDescription};
use log::trace;
use serde_json::{Map, Value};

/// Storage field names and the names clients see.
const RENAMES: [(&str, &str); 3] = [("_id", "id"), ("_app", "appId"), ("_user", "userId")];

/// Walks result rows with a resolved [`PermissionManager`].
struct ResultProjector<'a> {
    /// `None` for tokens without a role: renames only.
    manager: Option<PermissionManager>,
    user_id: &'a str,
}

impl ResultProjector<'_> {
    /// `None` when the row fails a role filter.
    fn prepare(&self, value: Value, path: &mut Vec<String>) -> Option<Value> {
        let Value::Object(row) = value else {
            return Some(value);
        };
        if is_opaque(&row) {
            return Some(Value::Object(row));
        }

        let Some(manager) = &self.manager else {
            let renamed = rename_internal(row)
                .into_iter()
                .filter_map(|(key, value)| self.prepare_child(value, path).map(|value| (key, value)))
                .collect();
            return Some(Value::Object(renamed));
        };

        if !self.passes_filters(manager, &row, path) {
            trace!("row at '{}' filtered for {}", path.join("."), self.user_id);
            return None;
        }

        let mut prepared = Map::new();
        for (key, value) in rename_internal(row) {
            path.push(key);
            let property = path.join(".");
            let value = if manager.has_read_permission(&property) {
                self.prepare_child(value, path)
            } else {
                trace!("{property} removed from result");
                None
            };
            if let (Some(key), Some(value)) = (path.pop(), value) {
                prepared.insert(key, value);
            }
        }
        Some(Value::Object(prepared))
    }

    /// Array elements share their array's path; filtered elements are dropped.
    fn prepare_child(&self, value: Value, path: &mut Vec<String>) -> Option<Value> {
        match value {
            Value::Array(items) => Some(Value::Array(self.prepare_rows(items, path))),
            other => self.prepare(other, path),
        }
    }

    fn prepare_rows(&self, rows: Vec<Value>, path: &mut Vec<String>) -> Vec<Value> {
        rows.into_iter()
            .filter_map(|row| self.prepare(row, path))
            .collect()
    }

    /// A row is kept only if every filter addressed to its level holds the
    /// caller's user id, either as the value or as an array member.
    fn passes_filters(&self, manager: &PermissionManager, row: &Map<String, Value>, path: &[String]) -> bool {
        manager.filters().iter().all(|key| {
            let (parent, field) = match key.rsplit_once('.') {
                Some((parent, field)) => (parent, field),
                None => ("", key.as_str()),
            };
            if parent != path.join(".") {
                return true;
            }
            match row.get(field) {
                Some(Value::Array(items)) => items.iter().any(|item| self.is_user(item)),
                Some(value) => self.is_user(value),
                None => false,
            }
        })
    }

    fn is_user(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => s == self.user_id,
            other => ObjectId::from_value(other).is_ok_and(|id| id.to_hex() == self.user_id),
        }
    }
}

/// Identifier and date values are leaves even though they are objects.
fn is_opaque(row: &Map<String, Value>) -> bool {
    row.len() == 1 && (row.contains_key(OID_KEY) || row.contains_key(DATE_KEY))
}

fn rename_internal(row: Map<String, Value>) -> Map<String, Value> {
    row.into_iter()
        .map(|(key, value)| {
            let key = RENAMES
                .iter()
                .find(|(from, _)| *from == key)
                .map_or(key, |(_, to)| (*to).to_string());
            (key, value)
        })
        .collect()
}

/// Strips what `token`'s role may not read from a query result.
///
/// `result` is a single row or an array of rows. Rows failing a role filter
/// are dropped (a single dropped row comes back as `null`); unreadable fields
/// are removed; `_id`, `_app` and `_user`
/// are renamed to `id`, `appId` and `userId` at every level.
///
/// A missing schema or token is a caller bug and fails with
/// [`ButtressError::ProjectionPrecondition`].
pub fn prepare_schema_result(
    result: Value,
    app_roles: &[AppRole],
    schema: Option<&SchemaDescription>,
    token: Option<&Token>,
) -> ButtressResult<Value> {
    let schema = schema.ok_or_else(|| {
        ButtressError::ProjectionPrecondition("Can't validate result without a data schema".to_string())
    })?;
    let token = token.ok_or_else(|| {
        ButtressError::ProjectionPrecondition("Can't validate result without a token".to_string())
    })?;

    let manager = match token.role() {
        Some(_) => Some(PermissionManager::for_token(app_roles, schema, token)?),
        None => None,
    };
    let projector = ResultProjector {
        manager,
        user_id: &token.user_id,
    };

    let mut path = Vec::new();
    Ok(match result {
        Value::Array(rows) => Value::Array(projector.prepare_rows(rows, &mut path)),
        row => projector.prepare(row, &mut path).unwrap_or(Value::Null),
    })
}
