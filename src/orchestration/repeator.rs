//! # Repeator
//!
//! Retry policy for errors raised by a task's work. The worker consults
//! [`Repeator::should_retry`] for every raised error; an authorized retry
//! bumps `metadata.retries`, sleeps `jitter * retries` and re-enters the
//! execution step. Faults (skip/fail) are never retried.

use super::errors::{short_type_name, RaisedError};
use super::task::Task;
use crate::constants::{events, metadata};
use serde_json::json;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

type MatchFn = Arc<dyn Fn(&RaisedError) -> bool + Send + Sync>;

/// Predicate over raised errors deciding whether they may be retried
#[derive(Clone)]
pub struct ErrorMatcher {
    name: String,
    matches: MatchFn,
}

impl ErrorMatcher {
    /// Match every raised error
    pub fn any() -> Self {
        Self {
            name: "*".to_string(),
            matches: Arc::new(|_| true),
        }
    }

    /// Match errors whose concrete type is `E`
    pub fn of<E>() -> Self
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            name: short_type_name::<E>().to_string(),
            matches: Arc::new(|error| error.is::<E>()),
        }
    }

    /// Match errors by their recorded kind name
    pub fn kind(kind: impl Into<String>) -> Self {
        let kind = kind.into();
        Self {
            name: kind.clone(),
            matches: Arc::new(move |error| error.kind() == kind),
        }
    }

    pub fn custom(
        name: impl Into<String>,
        predicate: impl Fn(&RaisedError) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            matches: Arc::new(predicate),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matches(&self, error: &RaisedError) -> bool {
        (self.matches)(error)
    }
}

impl fmt::Debug for ErrorMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ErrorMatcher").field(&self.name).finish()
    }
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries; zero disables retrying
    pub retries: u32,
    pub retry_on: Vec<ErrorMatcher>,
    /// Base delay, multiplied by the retry count before each attempt
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retries: 0,
            retry_on: vec![ErrorMatcher::any()],
            jitter: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(retries: u32) -> Self {
        Self {
            retries,
            ..Self::default()
        }
    }

    pub fn retry_on(mut self, matchers: impl IntoIterator<Item = ErrorMatcher>) -> Self {
        self.retry_on = matchers.into_iter().collect();
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }
}

pub struct Repeator<'a> {
    policy: &'a RetryPolicy,
}

impl<'a> Repeator<'a> {
    pub fn new(policy: &'a RetryPolicy) -> Self {
        Self { policy }
    }

    /// Whether another attempt is allowed after `attempted` retries
    pub fn permits(&self, attempted: u32, error: &RaisedError) -> bool {
        self.policy.retries > 0
            && attempted < self.policy.retries
            && self.policy.retry_on.iter().any(|matcher| matcher.matches(error))
    }

    pub fn delay_for(&self, retry: u32) -> Duration {
        self.policy.jitter.saturating_mul(retry)
    }

    /// Decide whether the task retries after `error`, recording the attempt when it does
    pub fn should_retry(&self, task: &mut Task, error: &RaisedError) -> bool {
        let attempted = task.result().retries();
        if !self.permits(attempted, error) {
            debug!(
                task = %task.name(),
                attempted = attempted,
                budget = self.policy.retries,
                error_kind = %error.kind(),
                "Retry denied"
            );
            return false;
        }

        let attempt = attempted + 1;
        if let Err(seal_error) = task.result_mut().insert_metadata(metadata::RETRIES, attempt) {
            warn!(task = %task.name(), error = %seal_error, "Unable to record retry");
            return false;
        }

        let delay = self.delay_for(attempt);
        warn!(
            task = %task.name(),
            task_id = %task.id(),
            attempt = attempt,
            remaining = self.policy.retries - attempt,
            delay_ms = delay.as_millis() as u64,
            cause = %error.reason(),
            "🔁 RETRY"
        );

        if let Some(registry) = task.settings().events.as_ref() {
            registry.publish(
                events::TASK_RETRIED,
                &json!({
                    "task_id": task.id(),
                    "task_name": task.name(),
                    "attempt": attempt,
                    "cause": error.reason(),
                }),
            );
        }

        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::num::ParseIntError;

    fn parse_error() -> RaisedError {
        RaisedError::new("x".parse::<i64>().unwrap_err())
    }

    #[test]
    fn test_budget_exhaustion() {
        let policy = RetryPolicy::new(3);
        let repeator = Repeator::new(&policy);
        let error = parse_error();

        assert!(repeator.permits(0, &error));
        assert!(repeator.permits(2, &error));
        assert!(!repeator.permits(3, &error));
    }

    #[test]
    fn test_zero_budget_never_retries() {
        let policy = RetryPolicy::default();
        assert!(!Repeator::new(&policy).permits(0, &parse_error()));
    }

    #[test]
    fn test_matchers_filter_errors() {
        let policy = RetryPolicy::new(2).retry_on([ErrorMatcher::of::<ParseIntError>()]);
        let repeator = Repeator::new(&policy);

        assert!(repeator.permits(0, &parse_error()));
        assert!(!repeator.permits(0, &RaisedError::with_kind("Timeout", "slow")));

        let by_kind = RetryPolicy::new(2).retry_on([ErrorMatcher::kind("Timeout")]);
        assert!(Repeator::new(&by_kind).permits(1, &RaisedError::with_kind("Timeout", "slow")));

        let none = RetryPolicy::new(2).retry_on([]);
        assert!(!Repeator::new(&none).permits(0, &parse_error()));
    }

    #[test]
    fn test_linear_delay() {
        let policy = RetryPolicy::new(3).with_jitter(Duration::from_millis(50));
        let repeator = Repeator::new(&policy);
        assert_eq!(repeator.delay_for(1), Duration::from_millis(50));
        assert_eq!(repeator.delay_for(3), Duration::from_millis(150));
        assert_eq!(ErrorMatcher::of::<ParseIntError>().name(), "ParseIntError");
    }

    proptest! {
        #[test]
        fn retries_never_exceed_budget(budget in 0u32..20, attempted in 0u32..40) {
            let policy = RetryPolicy::new(budget);
            let permitted = Repeator::new(&policy).permits(attempted, &parse_error());
            prop_assert_eq!(permitted, budget > 0 && attempted < budget);
        }

        #[test]
        fn delay_grows_linearly(jitter_ms in 0u64..1_000, retry in 0u32..10) {
            let policy = RetryPolicy::new(10).with_jitter(Duration::from_millis(jitter_ms));
            let repeator = Repeator::new(&policy);
            prop_assert_eq!(
                repeator.delay_for(retry),
                Duration::from_millis(jitter_ms * u64::from(retry))
            );
        }
    }
}
