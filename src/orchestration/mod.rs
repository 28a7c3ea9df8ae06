//! # Orchestration
//!
//! Task handlers, task instances and the [`Worker`] that drives a task
//! through validation, work, retries, callbacks and finalization.

pub mod errors;
pub mod guard;
pub mod middleware;
pub mod repeator;
pub mod settings;
pub mod task;
pub mod task_handler;
pub mod worker;

pub use errors::{Fault, Interrupt, RaisedError};
pub use guard::Guard;
pub use middleware::{Correlate, Middleware, Next, Runtime};
pub use repeator::{ErrorMatcher, Repeator, RetryPolicy};
pub use settings::Settings;
pub use task::Task;
pub use task_handler::{TaskDefinition, TaskHandler};
pub use worker::{ExecutionMode, Worker};
