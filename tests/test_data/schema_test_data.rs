use buttress::SchemaDescription;
use serde_json::json;

#[allow(dead_code)]
pub fn create_task_schema() -> SchemaDescription {
    serde_json::from_value(json!({
        "name": "task",
        "collection": "tasks",
        "properties": {
            "title": {"__type": "string", "__required": true},
            "tags": {"__type": "array"}
        }
    }))
    .unwrap()
}

/// Contact schema exercising nested objects, enums, sub-document arrays,
/// frozen fields and role-based reads.
#[allow(dead_code)]
pub fn create_contact_schema() -> SchemaDescription {
    serde_json::from_value(json!({
        "name": "contact",
        "collection": "contacts",
        "extends": ["timestamps"],
        "properties": {
            "name": {
                "__type": "string",
                "__required": true,
                "__permissions": [{"role": "viewer", "READ": "allow"}]
            },
            "email": {"__type": "string"},
            "status": {"__type": "string", "__enum": ["lead", "customer"], "__default": "lead"},
            "phone": {
                "mobile": {"__type": "string"},
                "office": {"__type": "string"}
            },
            "notes": {
                "__type": "array",
                "__schema": {
                    "text": {"__type": "string", "__required": true},
                    "pinned": {"__type": "boolean"}
                }
            },
            "ownerId": {"__type": "string", "__allowUpdate": false}
        },
        "roles": [
            {"name": "viewer", "dataDisposition": {"READ": "deny"}},
            {"name": "member", "dataDisposition": {"READ": "allow"}, "filter": {"ownerId": true}}
        ]
    }))
    .unwrap()
}
