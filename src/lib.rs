#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tasker Runtime
//!
//! In-process runtime for small units of business logic ("tasks").
//!
//! ## Overview
//!
//! A task declares typed inputs as [`attributes::Attribute`]s, implements its
//! work on a [`orchestration::TaskHandler`], and is driven by the
//! [`orchestration::Worker`] through a fixed lifecycle: attribute resolution
//! (source, default, coercion, validation), work with optional retries,
//! outcome callbacks and finalization. Every invocation produces a
//! [`state_machine::TaskResult`] with a state (`initialized`, `executing`,
//! `complete`, `interrupted`) and a status (`success`, `skipped`, `failed`).
//!
//! Nested tasks share the caller's [`chain::Chain`], so a failure thrown from
//! deep inside a call tree can be traced back to the task that caused it.
//!
//! ## Module Organization
//!
//! - [`attributes`] - Attribute declarations and the resolution pipeline
//! - [`state_machine`] - Result lifecycle and disposition
//! - [`orchestration`] - Handlers, tasks, the worker, middlewares and retries
//! - [`registry`] - Callback, coercion, validator and event registries
//! - [`config`] - Layered configuration
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust
//! use serde_json::json;
//! use tasker_runtime::prelude::*;
//!
//! let handler = TaskDefinition::new("Square")
//!     .attribute(Attribute::required("n").types([CoercionType::Integer]))
//!     .handler(|task| {
//!         let n = task.resolve_attribute("n").and_then(|v| v.as_i64()).unwrap_or(0);
//!         task.context().insert("square", n * n)?;
//!         Ok(())
//!     });
//!
//! let result = tasker_runtime::call(handler, json!({"n": "7"})).unwrap();
//! assert!(result.is_success());
//! assert_eq!(result.context().get("square"), Some(json!(49)));
//! ```

pub mod attributes;
pub mod chain;
pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod events;
pub mod locale;
pub mod logging;
pub mod orchestration;
pub mod registry;
pub mod state_machine;

pub use chain::Chain;
pub use context::Context;
pub use error::{Result, RuntimeError};
pub use orchestration::{Interrupt, Task, TaskHandler, Worker};
pub use state_machine::{TaskResult, TaskState, TaskStatus};

use std::sync::Arc;

/// Run a handler as a top-level task; faults come back as results
pub fn call(
    handler: Arc<dyn TaskHandler>,
    context: impl Into<Context>,
) -> std::result::Result<TaskResult, Interrupt> {
    Task::new(handler, context)?.execute()
}

/// Run a handler as a top-level task; statuses listed in the handler's
/// breakpoints come back as `Err`
pub fn call_strict(
    handler: Arc<dyn TaskHandler>,
    context: impl Into<Context>,
) -> std::result::Result<TaskResult, Interrupt> {
    Task::new(handler, context)?.execute_strict()
}

/// Commonly used types for defining and running tasks
pub mod prelude {
    pub use crate::attributes::{Attribute, Source, Validation};
    pub use crate::context::Context;
    pub use crate::orchestration::{
        Correlate, ErrorMatcher, Fault, Interrupt, RetryPolicy, Runtime, Settings, Task,
        TaskDefinition, TaskHandler, Worker,
    };
    pub use crate::registry::{
        Callback, CallbackType, CoercionType, EventRegistry, ValidatorKey,
    };
    pub use crate::state_machine::{TaskResult, TaskState, TaskStatus};
}
