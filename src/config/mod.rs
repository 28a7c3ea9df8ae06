//! # Runtime Configuration
//!
//! Layered configuration for the task runtime: built-in defaults, an optional
//! `tasker-runtime.toml`, an optional `tasker-runtime.<env>.toml` override
//! and `TASKER_RUNTIME__*` environment variables, in that order.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use tasker_runtime::config::ConfigManager;
//! use tasker_runtime::orchestration::Settings;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let settings = Settings::from_config(manager.config())?;
//! println!("retry budget: {}", settings.retry.retries);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

const STATUSES: &[&str] = &["success", "skipped", "failed"];
const SEVERITIES: &[&str] = &["debug", "info", "warn", "warning", "error"];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Retry budget for raised errors; zero disables retrying
    pub retries: u32,
    pub retry_jitter_seconds: f64,
    /// Statuses that make strict execution return an error
    pub task_breakpoints: Vec<String>,
    pub seal_results: bool,
    pub tags: Vec<String>,
    /// Severity finalized results are logged at
    pub result_log_level: String,
    pub logging: LoggingConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_jitter_seconds: 0.0,
            task_breakpoints: vec!["failed".to_string()],
            seal_results: true,
            tags: Vec::new(),
            result_log_level: "info".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults for an environment; `test` leaves results unsealed
    pub fn for_environment(environment: &str) -> Self {
        match environment {
            "test" => Self {
                seal_results: false,
                logging: LoggingConfig {
                    level: "debug".to_string(),
                    ..LoggingConfig::default()
                },
                ..Self::default()
            },
            "production" => Self {
                logging: LoggingConfig {
                    level: "info".to_string(),
                    format: LogFormat::Json,
                },
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    pub fn retry_jitter(&self) -> Duration {
        Duration::try_from_secs_f64(self.retry_jitter_seconds).unwrap_or(Duration::ZERO)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if !self.retry_jitter_seconds.is_finite() || self.retry_jitter_seconds < 0.0 {
            return Err(ConfigurationError::invalid_value(
                "retry_jitter_seconds",
                self.retry_jitter_seconds,
                "must be a non-negative number of seconds",
            ));
        }
        if let Some(status) = self
            .task_breakpoints
            .iter()
            .find(|status| !STATUSES.contains(&status.as_str()))
        {
            return Err(ConfigurationError::invalid_value(
                "task_breakpoints",
                status,
                "must be one of success, skipped, failed",
            ));
        }
        if !SEVERITIES.contains(&self.result_log_level.to_ascii_lowercase().as_str()) {
            return Err(ConfigurationError::invalid_value(
                "result_log_level",
                &self.result_log_level,
                "must be one of debug, info, warn, error",
            ));
        }
        if self.logging.level.trim().is_empty() {
            return Err(ConfigurationError::ValidationError(
                "logging.level cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `tasker_runtime=debug`
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_environment_defaults() {
        assert!(RuntimeConfig::default().seal_results);
        assert!(!RuntimeConfig::for_environment("test").seal_results);
        assert_eq!(
            RuntimeConfig::for_environment("production").logging.format,
            LogFormat::Json
        );
        assert_eq!(RuntimeConfig::for_environment("staging"), RuntimeConfig::default());
    }

    #[test]
    fn test_validation() {
        assert!(RuntimeConfig::default().validate().is_ok());

        let negative = RuntimeConfig {
            retry_jitter_seconds: -1.0,
            ..RuntimeConfig::default()
        };
        assert!(matches!(
            negative.validate(),
            Err(ConfigurationError::InvalidValue { field, .. }) if field == "retry_jitter_seconds"
        ));

        let unknown_status = RuntimeConfig {
            task_breakpoints: vec!["exploded".to_string()],
            ..RuntimeConfig::default()
        };
        assert!(unknown_status.validate().is_err());

        let bad_level = RuntimeConfig {
            result_log_level: "loud".to_string(),
            ..RuntimeConfig::default()
        };
        assert!(bad_level.validate().is_err());
    }

    #[test]
    fn test_retry_jitter_duration() {
        let config = RuntimeConfig {
            retry_jitter_seconds: 1.5,
            ..RuntimeConfig::default()
        };
        assert_eq!(config.retry_jitter(), Duration::from_millis(1500));
    }
}
