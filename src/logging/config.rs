//! Configuration management for the logging system
//!
//! Configuration is loaded from TOML files and then overridden by
//! `BUTTRESS_LOG_*` environment variables.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const VALID_LEVELS: [&str; 5] = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
const ENV_PREFIX: &str = "BUTTRESS_LOG_";
const FEATURE_ENV_PREFIX: &str = "BUTTRESS_LOG_FEATURE_";

/// Main logging configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// General logging settings
    pub general: GeneralConfig,
    /// Console output configuration
    pub console: ConsoleConfig,
    /// Per-module log levels, keyed by crate module (`schema`, `update`, ...)
    pub features: BTreeMap<String, String>,
}

/// General logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default log level for all modules
    pub default_level: String,
}

/// Console output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleConfig {
    /// Enable console output
    pub enabled: bool,
    /// Enable colors in console output
    pub colors: bool,
    /// Include timestamps
    pub include_timestamp: bool,
    /// Include module path
    pub include_module: bool,
    /// Emit one JSON object per event
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            console: ConsoleConfig::default(),
            features: Self::default_features(),
        }
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_level: "INFO".to_string(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            colors: true,
            include_timestamp: true,
            include_module: true,
            json: false,
        }
    }
}

impl LogConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        let mut config = Self::from_toml(&content)?;

        // Apply environment variable overrides
        config.apply_env_overrides();

        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env_overrides();
        config
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(std::env::vars());
    }

    /// Applies `BUTTRESS_LOG_*` style overrides from `vars`.
    pub fn apply_overrides(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            if let Some(feature) = key.strip_prefix(FEATURE_ENV_PREFIX) {
                self.features.insert(feature.to_lowercase(), value.to_uppercase());
                continue;
            }
            match key.strip_prefix(ENV_PREFIX) {
                Some("LEVEL") => self.general.default_level = value.to_uppercase(),
                Some("COLORS") => self.console.colors = value.parse().unwrap_or(true),
                Some("CONSOLE_ENABLED") => self.console.enabled = value.parse().unwrap_or(true),
                Some("JSON") => self.console.json = value.parse().unwrap_or(false),
                _ => {}
            }
        }
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?;

        // Create parent directories if they don't exist
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }

        std::fs::write(path, content).map_err(ConfigError::Io)?;
        Ok(())
    }

    /// Get default feature-specific log levels
    fn default_features() -> BTreeMap<String, String> {
        ["schema", "update", "permissions", "db_operations", "model"]
            .into_iter()
            .map(|feature| (feature.to_string(), "INFO".to_string()))
            .collect()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !VALID_LEVELS.contains(&self.general.default_level.as_str()) {
            return Err(ConfigError::InvalidLevel(self.general.default_level.clone()));
        }

        for (feature, level) in &self.features {
            if !VALID_LEVELS.contains(&level.as_str()) {
                return Err(ConfigError::InvalidFeatureLevel(feature.clone(), level.clone()));
            }
        }

        Ok(())
    }

    /// `EnvFilter` directives: the default level, then one
    /// `buttress::<feature>=<level>` per feature.
    #[must_use]
    pub fn filter_directives(&self) -> String {
        let mut directives = vec![self.general.default_level.to_lowercase()];
        directives.extend(
            self.features
                .iter()
                .map(|(feature, level)| format!("buttress::{feature}={}", level.to_lowercase())),
        );
        directives.join(",")
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse configuration: {0}")]
    Parse(String),
    #[error("Failed to serialize configuration: {0}")]
    Serialize(String),
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),
    #[error("Invalid log level for feature '{0}': {1}")]
    InvalidFeatureLevel(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = LogConfig::from_toml(
            r#"
            [general]
            default_level = "DEBUG"

            [features]
            update = "TRACE"
            "#,
        )
        .unwrap();
        assert_eq!(config.general.default_level, "DEBUG");
        assert!(config.console.enabled);
        assert_eq!(config.features.get("update").map(String::as_str), Some("TRACE"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let mut config = LogConfig::default();
        config.apply_overrides([
            ("BUTTRESS_LOG_LEVEL".to_string(), "warn".to_string()),
            ("BUTTRESS_LOG_FEATURE_SCHEMA".to_string(), "debug".to_string()),
            ("BUTTRESS_LOG_JSON".to_string(), "true".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);
        assert_eq!(config.general.default_level, "WARN");
        assert_eq!(config.features["schema"], "DEBUG");
        assert!(config.console.json);
    }

    #[test]
    fn test_invalid_levels_are_rejected() {
        let mut config = LogConfig::default();
        config.features.insert("model".to_string(), "LOUD".to_string());
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidFeatureLevel(feature, _)) if feature == "model"
        ));
        config.general.default_level = "VERBOSE".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidLevel(_))));
    }

    #[test]
    fn test_filter_directives() {
        let mut config = LogConfig::default();
        config.features.clear();
        config.features.insert("update".to_string(), "DEBUG".to_string());
        assert_eq!(config.filter_directives(), "info,buttress::update=debug");
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("logging.toml");
        let config = LogConfig::default();
        config.save_to_file(&path).unwrap();
        assert_eq!(LogConfig::from_toml(&std::fs::read_to_string(&path).unwrap()).unwrap(), config);
    }
}
