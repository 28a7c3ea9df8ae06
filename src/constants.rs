//! # Runtime Constants
//!
//! Metadata keys, event names and default values shared by the worker, the
//! attribute pipeline and the retry policy.

/// Keys written into result metadata
pub mod metadata {
    pub const REASON: &str = "reason";
    pub const MESSAGES: &str = "messages";
    pub const RETRIES: &str = "retries";
    pub const CAUSE: &str = "cause";
    pub const THREW_FAILURE: &str = "threw_failure";
    pub const CAUSED_FAILURE: &str = "caused_failure";
    pub const CORRELATION_ID: &str = "correlation_id";
    pub const RUNTIME_MS: &str = "runtime_ms";
}

/// Events published by the worker after finalization
pub mod events {
    pub const TASK_EXECUTED: &str = "task.executed";
    pub const TASK_SUCCESS: &str = "task.success";
    pub const TASK_SKIPPED: &str = "task.skipped";
    pub const TASK_FAILED: &str = "task.failed";
    pub const TASK_RETRIED: &str = "task.retried";
}

/// Locale keys resolved through the translation service
pub mod locale_keys {
    pub const ATTRIBUTE_REQUIRED: &str = "attributes.required";
    pub const ATTRIBUTE_UNDEFINED_SOURCE: &str = "attributes.undefined_source";
    pub const ATTRIBUTE_UNDEFINED_METHOD: &str = "attributes.undefined_method";
    pub const COERCION_INTO: &str = "coercions.into";
    pub const COERCION_INTO_ANY: &str = "coercions.into_any";
    pub const FAULT_UNSPECIFIED: &str = "faults.unspecified";
    pub const FAULT_UNDEFINED_WORK: &str = "faults.undefined_work";
}

/// Reason recorded when a task halts without giving one
pub const DEFAULT_FAULT_REASON: &str = "no reason given";

/// Separator between full messages when errors are joined into a reason
pub const ERROR_SEPARATOR: &str = ". ";
