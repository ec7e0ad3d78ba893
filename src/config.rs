use crate::error::{ButtressError, ButtressResult};
use crate::logging::LogConfig;
use log::info;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const STORAGE_PATH_ENV: &str = "BUTTRESS_STORAGE_PATH";
pub const SCHEMA_DIR_ENV: &str = "BUTTRESS_SCHEMA_DIR";

/// Configuration for a Buttress node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Path where the sled database lives
    pub storage_path: PathBuf,
    /// Directory of `*.json` schema descriptions loaded at startup
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_dir: Option<PathBuf>,
    /// Prefix for collection names, `<app>-<collection>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_short_id: Option<String>,
    #[serde(default)]
    pub logging: LogConfig,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("data"),
            schema_dir: None,
            app_short_id: None,
            logging: LogConfig::default(),
        }
    }
}

impl NodeConfig {
    /// Create a new node configuration with the specified storage path
    pub fn new(storage_path: PathBuf) -> Self {
        Self {
            storage_path,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_schema_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.schema_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_app_short_id(mut self, app: impl Into<String>) -> Self {
        self.app_short_id = Some(app.into());
        self
    }

    /// Applies overrides from `vars` (normally the process environment).
    pub fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        let vars: Vec<(String, String)> = vars.into_iter().collect();
        for (key, value) in &vars {
            match key.as_str() {
                STORAGE_PATH_ENV => self.storage_path = PathBuf::from(value),
                SCHEMA_DIR_ENV => self.schema_dir = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        self.logging.apply_overrides(vars);
    }
}

/// Loads a node configuration from TOML, or JSON when the file has a
/// `.json` extension, then applies environment overrides.
pub fn load_node_config(path: impl AsRef<Path>) -> ButtressResult<NodeConfig> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path)?;

    let is_json = path.extension().is_some_and(|ext| ext == "json");
    let mut config: NodeConfig = if is_json {
        serde_json::from_str(&content)?
    } else {
        toml::from_str(&content)
            .map_err(|e| ButtressError::Config(format!("{}: {e}", path.display())))?
    };

    config.apply_overrides(std::env::vars());
    config
        .logging
        .validate()
        .map_err(|e| ButtressError::Config(e.to_string()))?;

    info!("Loaded node config from {}", path.display());
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overrides() {
        let mut config = NodeConfig::default();
        config.apply_overrides([
            (STORAGE_PATH_ENV.to_string(), "/tmp/store".to_string()),
            (SCHEMA_DIR_ENV.to_string(), "/tmp/schemas".to_string()),
            ("BUTTRESS_LOG_LEVEL".to_string(), "debug".to_string()),
        ]);
        assert_eq!(config.storage_path, PathBuf::from("/tmp/store"));
        assert_eq!(config.schema_dir, Some(PathBuf::from("/tmp/schemas")));
        assert_eq!(config.logging.general.default_level, "DEBUG");
    }

    #[test]
    fn test_toml_round_trip() {
        let config = NodeConfig::new(PathBuf::from("store")).with_app_short_id("crm");
        let text = toml::to_string(&config).unwrap();
        assert_eq!(toml::from_str::<NodeConfig>(&text).unwrap(), config);
    }
}
