//! Configuration Error Types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A configuration source could not be read or parsed
    #[error("Failed to load configuration from '{}': {error}", config_directory.display())]
    LoadError {
        config_directory: PathBuf,
        error: String,
    },

    /// Invalid configuration value
    #[error("Invalid value '{value}' for field '{field}': {context}")]
    InvalidValue {
        field: String,
        value: String,
        context: String,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl ConfigurationError {
    pub fn invalid(field: impl Into<String>, context: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: String::new(),
            context: context.into(),
        }
    }

    pub fn invalid_value(
        field: impl Into<String>,
        value: impl ToString,
        context: impl Into<String>,
    ) -> Self {
        Self::InvalidValue {
            field: field.into(),
            value: value.to_string(),
            context: context.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigurationError>;
