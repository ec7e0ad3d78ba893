//! Console output handler with color and JSON support

use crate::logging::config::ConsoleConfig;
use std::io;
use tracing_subscriber::fmt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

/// Console output handler writing to stderr
pub struct ConsoleOutput {
    config: ConsoleConfig,
}

impl ConsoleOutput {
    /// Create a new console output handler
    pub fn new(config: &ConsoleConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Create a tracing layer for console output, filtered by `filter`
    pub fn create_layer(&self, filter: EnvFilter) -> Box<dyn Layer<Registry> + Send + Sync> {
        let layer = fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(self.config.colors)
            .with_target(self.config.include_module);

        if self.config.json {
            layer.json().with_filter(filter).boxed()
        } else if self.config.include_timestamp {
            layer.with_filter(filter).boxed()
        } else {
            layer.without_time().with_filter(filter).boxed()
        }
    }
}
