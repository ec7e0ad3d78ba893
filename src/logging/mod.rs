//! # Logging System
//!
//! Library code logs through the `log` macros. [`LoggingSystem`] installs a
//! `tracing-subscriber` pipeline that receives those records, filtered per
//! crate module according to [`LogConfig`].

pub mod config;
pub mod outputs;

pub use config::{ConfigError, LogConfig};

use once_cell::sync::OnceCell;
use outputs::ConsoleOutput;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Global logging configuration instance
static LOGGING_CONFIG: OnceCell<Arc<RwLock<LogConfig>>> = OnceCell::new();

pub struct LoggingSystem;

impl LoggingSystem {
    /// Initialize the logging system with default configuration
    pub async fn init_default() -> Result<(), LoggingError> {
        Self::init_with_config(LogConfig::from_env()).await
    }

    /// Initialize the logging system with a custom configuration.
    ///
    /// The configuration is stored only once a subscriber is installed, so a
    /// failed attempt can be retried.
    pub async fn init_with_config(config: LogConfig) -> Result<(), LoggingError> {
        if Self::is_initialized() {
            return Err(LoggingError::AlreadyInitialized);
        }
        config.validate()?;
        let directives = config.filter_directives();
        let filter = EnvFilter::try_new(&directives)
            .map_err(|e| LoggingError::Config(format!("Invalid filter: {e}")))?;
        let console = config
            .console
            .enabled
            .then(|| ConsoleOutput::new(&config.console).create_layer(filter));

        tracing_subscriber::registry()
            .with(console)
            .try_init()
            .map_err(|e| LoggingError::Subscriber(e.to_string()))?;

        // Store configuration globally
        LOGGING_CONFIG
            .set(Arc::new(RwLock::new(config)))
            .map_err(|_| LoggingError::AlreadyInitialized)?;

        tracing::debug!(directives = %directives, "Logging initialized");
        Ok(())
    }

    /// Get the global logging configuration
    pub async fn get_config() -> Option<LogConfig> {
        match LOGGING_CONFIG.get() {
            Some(config) => Some(config.read().await.clone()),
            None => None,
        }
    }

    #[must_use]
    pub fn is_initialized() -> bool {
        LOGGING_CONFIG.get().is_some()
    }
}

/// Logging system errors
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Logging system already initialized")]
    AlreadyInitialized,
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Failed to install subscriber: {0}")]
    Subscriber(String),
    #[error("Config error: {0}")]
    ConfigError(#[from] ConfigError),
}
