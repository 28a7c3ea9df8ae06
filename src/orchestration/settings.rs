//! # Task Settings
//!
//! Per-definition runtime settings: retry policy, strict-mode breakpoints,
//! sealing, result log severity and the registries the attribute pipeline
//! resolves against. [`Settings::from_config`] maps the layered
//! [`RuntimeConfig`] onto these defaults.

use super::errors::RaisedError;
use super::repeator::RetryPolicy;
use super::task::Task;
use crate::config::{ConfigurationError, RuntimeConfig};
use crate::locale::{Locale, Translate};
use crate::logging::Severity;
use crate::registry::coercion_registry::CoercionRegistry;
use crate::registry::event_registry::EventRegistry;
use crate::registry::validator_registry::ValidatorRegistry;
use crate::state_machine::TaskStatus;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Observer notified when work raises an error, before any strict re-raise
pub type ExceptionHandler = Arc<dyn Fn(&Task, &RaisedError) + Send + Sync>;

#[derive(Clone)]
pub struct Settings {
    pub retry: RetryPolicy,
    /// Statuses that make strict execution return an error
    pub task_breakpoints: Vec<TaskStatus>,
    pub seal_results: bool,
    pub tags: Vec<String>,
    pub log_level: Severity,
    pub coercions: Arc<CoercionRegistry>,
    pub validators: Arc<ValidatorRegistry>,
    pub locale: Arc<dyn Translate>,
    pub events: Option<Arc<EventRegistry>>,
    pub exception_handler: Option<ExceptionHandler>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            task_breakpoints: vec![TaskStatus::Failed],
            seal_results: true,
            tags: Vec::new(),
            log_level: Severity::Info,
            coercions: Arc::new(CoercionRegistry::new()),
            validators: Arc::new(ValidatorRegistry::new()),
            locale: Arc::new(Locale::english()),
            events: None,
            exception_handler: None,
        }
    }
}

impl Settings {
    /// Settings seeded from loaded configuration; registries keep their defaults
    pub fn from_config(config: &RuntimeConfig) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let task_breakpoints = config
            .task_breakpoints
            .iter()
            .map(|status| {
                status
                    .parse::<TaskStatus>()
                    .map_err(|reason| ConfigurationError::invalid("task_breakpoints", reason))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let jitter = Duration::try_from_secs_f64(config.retry_jitter_seconds)
            .map_err(|e| ConfigurationError::invalid("retry_jitter_seconds", e.to_string()))?;

        let log_level = config
            .result_log_level
            .parse::<Severity>()
            .map_err(|reason| ConfigurationError::invalid("result_log_level", reason))?;

        Ok(Self {
            retry: RetryPolicy::new(config.retries).with_jitter(jitter),
            task_breakpoints,
            seal_results: config.seal_results,
            tags: config.tags.clone(),
            log_level,
            ..Self::default()
        })
    }

    pub fn is_breakpoint(&self, status: TaskStatus) -> bool {
        self.task_breakpoints.contains(&status)
    }

    pub fn with_events(mut self, events: Arc<EventRegistry>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_exception_handler(
        mut self,
        handler: impl Fn(&Task, &RaisedError) + Send + Sync + 'static,
    ) -> Self {
        self.exception_handler = Some(Arc::new(handler));
        self
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("retry", &self.retry)
            .field("task_breakpoints", &self.task_breakpoints)
            .field("seal_results", &self.seal_results)
            .field("tags", &self.tags)
            .field("log_level", &self.log_level)
            .field("coercions", &self.coercions)
            .field("validators", &self.validators)
            .field("events", &self.events.is_some())
            .field("exception_handler", &self.exception_handler.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.retry.retries, 0);
        assert!(settings.is_breakpoint(TaskStatus::Failed));
        assert!(!settings.is_breakpoint(TaskStatus::Skipped));
        assert!(settings.seal_results);
    }

    #[test]
    fn test_from_config() {
        let config = RuntimeConfig {
            retries: 2,
            retry_jitter_seconds: 0.25,
            task_breakpoints: vec!["skipped".to_string(), "failed".to_string()],
            seal_results: false,
            tags: vec!["billing".to_string()],
            result_log_level: "debug".to_string(),
            ..RuntimeConfig::default()
        };

        let settings = Settings::from_config(&config).unwrap();
        assert_eq!(settings.retry.retries, 2);
        assert_eq!(settings.retry.jitter, Duration::from_millis(250));
        assert!(settings.is_breakpoint(TaskStatus::Skipped));
        assert!(!settings.seal_results);
        assert_eq!(settings.tags, vec!["billing".to_string()]);
        assert_eq!(settings.log_level, Severity::Debug);
    }

    #[test]
    fn test_from_config_rejects_unknown_breakpoint() {
        let config = RuntimeConfig {
            task_breakpoints: vec!["exploded".to_string()],
            ..RuntimeConfig::default()
        };
        assert!(Settings::from_config(&config).is_err());
    }
}
