mod test_data;

use buttress::schema::{flatten_body, flatten_schema, CompiledSchema, SchemaRegistry};
use buttress::{apply_app_properties, validate, FieldType, SchemaError};
use serde_json::json;
use test_data::schema_test_data::{create_contact_schema, create_task_schema};

#[test]
fn test_missing_title_then_exact_population() {
    let schema = create_task_schema();

    let result = validate(&schema, &json!({"tags": ["x"]})).unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.missing, vec!["title".to_string()]);

    let body = json!({"title": "T", "tags": ["x"]});
    assert!(validate(&schema, &body).unwrap().is_valid);
    assert_eq!(apply_app_properties(&schema, &body).unwrap(), body);
}

#[test]
fn test_flattened_paths_are_leaves_only() {
    let flattened = flatten_schema(&create_contact_schema()).unwrap();
    let paths: Vec<&str> = flattened.paths().collect();
    assert_eq!(
        paths,
        vec!["name", "email", "status", "phone.mobile", "phone.office", "notes", "ownerId"]
    );
    assert!(flattened.get("phone").is_none());
    assert_eq!(flattened.get("notes").unwrap().field_type, FieldType::Array);
}

#[test]
fn test_enum_rejects_unlisted_values() {
    let schema = create_contact_schema();

    let result = validate(&schema, &json!({"name": "Ann", "status": "churned"})).unwrap();
    assert!(!result.is_valid);
    assert!(result.invalid[0].starts_with("status"));

    assert!(validate(&schema, &json!({"name": "Ann", "status": "customer"})).unwrap().is_valid);
    assert!(validate(&schema, &json!({"name": "Ann", "status": null})).unwrap().is_valid);
}

#[test]
fn test_batch_reports_first_failure() {
    let schema = create_task_schema();
    let result = validate(&schema, &json!([{"title": "a"}, {"tags": []}, {"title": 5}])).unwrap();
    assert!(!result.is_valid);
    assert_eq!(result.missing, vec!["title".to_string()]);
    assert!(result.invalid.is_empty());
}

#[test]
fn test_population_defaults_and_idempotence() {
    let schema = create_contact_schema();
    let populated = apply_app_properties(&schema, &json!({"name": "Ann", "unknown": true})).unwrap();

    assert_eq!(populated["status"], json!("lead"));
    assert_eq!(populated["notes"], json!([]));
    assert!(populated.get("phone").is_some());
    assert!(populated.get("unknown").is_none());

    // Re-populating an already populated document changes nothing.
    let flattened = flatten_schema(&schema).unwrap();
    let again = buttress::schema::populate(&flattened, &flatten_body(&populated));
    assert_eq!(serde_json::Value::Object(again), populated);
}

#[test]
fn test_registry_resolves_by_name_and_collection() {
    let registry = SchemaRegistry::from_descriptions(vec![create_task_schema(), create_contact_schema()])
        .unwrap();
    assert_eq!(registry.names(), vec!["contact".to_string(), "task".to_string()]);
    assert_eq!(registry.get_by_collection("tasks").unwrap().name(), "task");
    assert!(matches!(registry.get("invoice"), Err(SchemaError::NotFound(_))));
}

#[test]
fn test_registry_loads_directory() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("task.json"),
        serde_json::to_string(&create_task_schema()).unwrap(),
    )
    .unwrap();
    std::fs::write(dir.path().join("README.md"), "not a schema").unwrap();

    let mut registry = SchemaRegistry::new();
    assert_eq!(registry.load_from_dir(dir.path()).unwrap(), 1);
    let compiled = registry.get("task").unwrap();
    assert_eq!(compiled.flattened.len(), 2);
}

#[test]
fn test_compiled_schema_has_three_array_paths() {
    let compiled = CompiledSchema::compile(create_task_schema()).unwrap();
    let tag_paths = compiled
        .path_context
        .patterns()
        .filter(|p| p.starts_with("^tags"))
        .count();
    assert_eq!(tag_paths, 3);
}

#[test]
fn test_large_number_populates_string_field_exactly() {
    let schema: buttress::SchemaDescription = serde_json::from_value(json!({
        "name": "code",
        "collection": "codes",
        "properties": {"code": {"__type": "string"}}
    }))
    .unwrap();
    let populated = apply_app_properties(&schema, &json!({"code": 1e20})).unwrap();
    assert_eq!(populated, json!({"code": "100000000000000000000"}));
}
