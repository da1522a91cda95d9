//! Configuration management for prettybox
//!
//! This module provides a layered configuration system that loads settings from:
//! 1. Default values (embedded in structs)
//! 2. TOML configuration file
//! 3. Environment variables (highest priority)
//!
//! # Usage
//!
//! ```no_run
//! use prettybox::config::Config;
//!
//! let config = Config::load().expect("Failed to load configuration");
//! println!("Render deadline: {}", config.render.deadline);
//! ```
//!
//! # Environment Variables
//!
//! Configuration can be overridden using environment variables with the pattern:
//! `PRETTYBOX__<section>__<key>`
//!
//! Examples:
//! - `PRETTYBOX__RENDER__DEADLINE=2s`
//! - `PRETTYBOX__FETCH__WORKERS=4`
//! - `PRETTYBOX__STORE__PATH=/tmp/prettybox`
//!
//! # Configuration File
//!
//! By default, the configuration is loaded from `config/prettybox.toml`.
//! This can be overridden using the `PRETTYBOX_CONFIG` environment variable.

mod models;
mod sources;
mod validation;

pub use crate::humanize::HumanDuration;
pub use models::{Config, FetchConfig, RenderConfig, StoreConfig};
pub use validation::ValidationError;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] ValidationError),
}

impl Config {
    /// Load configuration from all sources (file + environment)
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file is malformed or validation
    /// fails (zero workers, schema wait exceeding the render deadline, ...).
    pub fn load() -> Result<Self, ConfigError> {
        let config = sources::load()?;
        validation::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific path
    ///
    /// Useful for testing with custom configuration files.
    pub fn load_from_path(path: std::path::PathBuf) -> Result<Self, ConfigError> {
        let config = sources::load_from_sources(path)?;
        validation::validate(&config)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[fetch]
workers = 2
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.fetch.workers, 2);
        assert_eq!(config.render.deadline.as_millis(), 1_000);
    }

    #[test]
    fn test_validation_catches_bad_schema_wait() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[fetch]
schema_wait = "5s"

[render]
deadline = "1s"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let result = Config::load_from_path(config_path);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::ValidationError(ValidationError::SchemaWaitExceedsDeadline { .. })
        ));
    }

    #[test]
    fn test_full_config_example() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let toml_content = r#"
[fetch]
workers = 3
connect_timeout = "5s"
request_timeout = "30s"
schema_wait = "600ms"
user_agent = "inspector-bridge/2.0"

[render]
deadline = "1500ms"

[store]
path = "data/inspector"
        "#;

        fs::write(&config_path, toml_content).unwrap();

        let config = Config::load_from_path(config_path).unwrap();
        assert_eq!(config.fetch.workers, 3);
        assert_eq!(config.fetch.connect_timeout.as_millis(), 5_000);
        assert_eq!(config.fetch.user_agent, "inspector-bridge/2.0");
        assert_eq!(config.render.deadline.as_millis(), 1_500);
        assert_eq!(config.store.path.to_str().unwrap(), "data/inspector");
    }
}
