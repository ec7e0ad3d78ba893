use buttress::logging::LogConfig;
use buttress::{load_node_config, ButtressError, NodeConfig};
use std::path::PathBuf;

#[test]
fn test_load_toml_node_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node_config.toml");
    std::fs::write(
        &path,
        r#"
        storage_path = "store"
        schema_dir = "schemas"
        app_short_id = "crm"

        [logging.general]
        default_level = "WARN"

        [logging.features]
        update = "DEBUG"
        "#,
    )
    .unwrap();

    let config = load_node_config(&path).unwrap();
    assert_eq!(config.storage_path, PathBuf::from("store"));
    assert_eq!(config.schema_dir, Some(PathBuf::from("schemas")));
    assert_eq!(config.app_short_id.as_deref(), Some("crm"));
    assert_eq!(config.logging.general.default_level, "WARN");
    assert!(config.logging.filter_directives().contains("buttress::update=debug"));
}

#[test]
fn test_load_json_node_config() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node_config.json");
    let expected = NodeConfig::new(PathBuf::from("data/db")).with_app_short_id("crm");
    std::fs::write(&path, serde_json::to_string(&expected).unwrap()).unwrap();

    let config = load_node_config(&path).unwrap();
    assert_eq!(config.storage_path, expected.storage_path);
    assert_eq!(config.app_short_id, expected.app_short_id);
}

#[test]
fn test_invalid_log_level_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("node_config.toml");
    std::fs::write(
        &path,
        "storage_path = \"store\"\n[logging.general]\ndefault_level = \"LOUD\"\n",
    )
    .unwrap();

    let err = load_node_config(&path).unwrap_err();
    assert!(matches!(err, ButtressError::Config(_)));
}

#[test]
fn test_missing_file_is_io_error() {
    let err = load_node_config("does/not/exist.toml").unwrap_err();
    assert!(matches!(err, ButtressError::Io(_)));
}

#[test]
fn test_log_config_file_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("logging.toml");

    let mut config = LogConfig::default();
    config.apply_overrides([("BUTTRESS_LOG_FEATURE_SCHEMA".to_string(), "trace".to_string())]);
    config.save_to_file(&path).unwrap();

    let loaded = LogConfig::from_file(&path).unwrap();
    assert_eq!(loaded, config);
    assert_eq!(loaded.features["schema"], "TRACE");
}
