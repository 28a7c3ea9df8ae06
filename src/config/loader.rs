//! Configuration Loader
//!
//! Environment-aware loading built on the `config` crate. Every file source is
//! optional, so a missing directory yields the environment's defaults.

use super::error::{ConfigResult, ConfigurationError};
use super::RuntimeConfig;
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

const BASE_NAME: &str = "tasker-runtime";
const ENV_PREFIX: &str = "TASKER_RUNTIME";

#[derive(Debug)]
pub struct ConfigManager {
    config: RuntimeConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    /// Load configuration from a specific directory
    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load configuration from a specific directory with explicit environment
    /// This is useful for testing without modifying global environment variables
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = environment,
            config_directory = %config_directory.display(),
            "Loading runtime configuration"
        );

        let config = Self::load_and_merge_config(&config_directory, environment)?;
        config.validate()?;

        debug!(
            retries = config.retries,
            seal_results = config.seal_results,
            breakpoints = ?config.task_breakpoints,
            "Runtime configuration loaded"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    /// Detect current environment from environment variables
    fn detect_environment() -> String {
        env::var("TASKER_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// `config/` relative to the working directory
    fn default_config_directory() -> PathBuf {
        PathBuf::from("config")
    }

    fn load_and_merge_config(
        config_directory: &Path,
        environment: &str,
    ) -> ConfigResult<RuntimeConfig> {
        let load_error = |error: config::ConfigError| ConfigurationError::LoadError {
            config_directory: config_directory.to_path_buf(),
            error: error.to_string(),
        };

        let defaults = Config::try_from(&RuntimeConfig::for_environment(environment))
            .map_err(load_error)?;
        let base = config_directory.join(BASE_NAME);
        let overrides = config_directory.join(format!("{BASE_NAME}.{environment}"));

        Config::builder()
            .add_source(defaults)
            .add_source(File::with_name(&base.to_string_lossy()).required(false))
            .add_source(File::with_name(&overrides.to_string_lossy()).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("task_breakpoints")
                    .with_list_parse_key("tags"),
            )
            .build()
            .and_then(Config::try_deserialize)
            .map_err(load_error)
    }
}
