//! # Structured Logging Module
//!
//! Environment-aware structured logging for task execution. Results are
//! logged once per finalization with their identity, state, status and
//! reason as structured fields.

use crate::config::{LogFormat, LoggingConfig};
use crate::state_machine::TaskResult;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing_subscriber::{fmt as subscriber_fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Severity a payload is emitted at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            _ => Err(format!("Invalid log severity: {s}")),
        }
    }
}

macro_rules! at_severity {
    ($severity:expr, $($arg:tt)+) => {
        match $severity {
            Severity::Debug => tracing::debug!($($arg)+),
            Severity::Info => tracing::info!($($arg)+),
            Severity::Warn => tracing::warn!($($arg)+),
            Severity::Error => tracing::error!($($arg)+),
        }
    };
}

/// Initialize structured logging from the detected environment
pub fn init_structured_logging() {
    let environment = get_environment();
    let config = LoggingConfig {
        level: get_log_level(&environment).to_string(),
        ..LoggingConfig::default()
    };
    init_with_config(&config);
}

/// Initialize structured logging once; an existing global subscriber is kept
pub fn init_with_config(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.level.clone()));

        let layer = match config.format {
            LogFormat::Json => subscriber_fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .json()
                .with_filter(filter)
                .boxed(),
            LogFormat::Pretty => subscriber_fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_level(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed(),
        };

        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized - continuing with existing subscriber");
        }

        tracing::info!(
            environment = %get_environment(),
            level = %config.level,
            format = ?config.format,
            "🔧 STRUCTURED LOGGING: Initialized"
        );
    });
}

/// Get current environment from environment variables
pub(crate) fn get_environment() -> String {
    std::env::var("TASKER_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
}

/// Get log level based on environment
fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Something the logger can render
#[derive(Debug, Clone, Copy)]
pub enum LogPayload<'a> {
    Result(&'a TaskResult),
    Message(&'a str),
}

impl<'a> From<&'a TaskResult> for LogPayload<'a> {
    fn from(result: &'a TaskResult) -> Self {
        Self::Result(result)
    }
}

impl<'a> From<&'a str> for LogPayload<'a> {
    fn from(message: &'a str) -> Self {
        Self::Message(message)
    }
}

/// Emit a payload at the given severity
pub fn emit<'a>(severity: Severity, payload: impl Into<LogPayload<'a>>) {
    match payload.into() {
        LogPayload::Result(result) => log_task_result(severity, result),
        LogPayload::Message(message) => at_severity!(
            severity,
            timestamp = %Utc::now().to_rfc3339(),
            "{}",
            message
        ),
    }
}

/// Log a finalized result as a structured task operation
pub fn log_task_result(severity: Severity, result: &TaskResult) {
    at_severity!(
        severity,
        task_id = %result.task_id(),
        task_name = %result.task_name(),
        chain_id = %result.chain_id(),
        index = result.index(),
        state = %result.state(),
        status = %result.status(),
        reason = result.reason(),
        retries = result.retries(),
        tags = ?result.tags(),
        timestamp = %Utc::now().to_rfc3339(),
        "📋 TASK_OPERATION"
    );
}

/// Log error with full context
pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "❌ ERROR"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(get_log_level("test"), "debug");
        assert_eq!(get_log_level("development"), "debug");
        assert_eq!(get_log_level("production"), "info");
        assert_eq!(get_log_level("unknown"), "debug");
    }

    #[test]
    fn test_severity_parsing() {
        assert_eq!("WARNING".parse::<Severity>(), Ok(Severity::Warn));
        assert_eq!("error".parse::<Severity>(), Ok(Severity::Error));
        assert!("loud".parse::<Severity>().is_err());
        assert_eq!(Severity::default(), Severity::Info);
        assert_eq!(Severity::Debug.to_string(), "debug");
    }

    #[test]
    fn test_emit_accepts_results_and_messages() {
        let result = TaskResult::new(
            uuid::Uuid::new_v4(),
            "Noop",
            uuid::Uuid::new_v4(),
            0,
            crate::context::Context::new(),
        );
        emit(Severity::Debug, &result);
        emit(Severity::Warn, "plain message");
        log_error("worker", "finalize", "boom", None);
    }
}
