//! # Worker
//!
//! Drives one task through its lifecycle:
//!
//! 1. middlewares wrap everything below
//! 2. `before_validation` callbacks, then attribute resolution; any attribute
//!    error fails the result with the joined messages
//! 3. `before_execution` callbacks, `start`, then the handler's work, repeated
//!    while the [`Repeator`] authorizes a retry
//! 4. interrupts are classified: faults are adopted, raised errors fail the
//!    result, undefined work fails it and skips the post-execution callbacks
//! 5. `executed` settles the state, then state, status and outcome callbacks run
//! 6. finalization seals, records the chain entry, logs and publishes events
//!
//! Safe execution only returns `Err` for undefined work and for errors a
//! middleware raises after the result has settled. Strict execution
//! additionally returns raised errors, and faults whose status is one of the
//! configured breakpoints.

use super::errors::{Fault, Interrupt};
use super::middleware::Next;
use super::repeator::Repeator;
use super::task::Task;
use crate::attributes::value;
use crate::constants::{events, locale_keys, metadata};
use crate::error::RuntimeError;
use crate::logging;
use crate::registry::callback_registry::CallbackType;
use crate::state_machine::TaskResult;
use serde_json::Map;
use tracing::{debug, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Safe,
    Strict,
}

pub struct Worker;

impl Worker {
    pub fn execute(task: &mut Task) -> Result<TaskResult, Interrupt> {
        Self::run(task, ExecutionMode::Safe)
    }

    pub fn execute_strict(task: &mut Task) -> Result<TaskResult, Interrupt> {
        Self::run(task, ExecutionMode::Strict)
    }

    #[instrument(skip(task), fields(task_name = %task.name(), task_id = %task.id()))]
    pub fn run(task: &mut Task, mode: ExecutionMode) -> Result<TaskResult, Interrupt> {
        if task.is_sealed() || !task.result().is_initialized() {
            return Err(RuntimeError::Sealed("task").into());
        }

        let definition = task.definition().clone();
        let mut lifecycle = |task: &mut Task| Self::lifecycle(task, mode);
        let outcome = Next::new(definition.middlewares(), &mut lifecycle).run(task);

        let outcome = match outcome {
            Err(interrupt) if interrupt.is_undefined_work() => Err(interrupt),
            // The result is already settled; strict mode returns these below
            Err(Interrupt::Raised(error))
                if mode == ExecutionMode::Safe && task.result().is_executed() =>
            {
                logging::log_error(
                    "worker",
                    "middleware",
                    &error.to_string(),
                    Some(task.name()),
                );
                Err(Interrupt::Raised(error))
            }
            // Safe lifecycles only surface undefined work, so anything else
            // here was raised by a middleware.
            Err(interrupt) if mode == ExecutionMode::Safe || !task.result().is_executed() => {
                let pending = Self::absorb(task, interrupt, mode);
                if let Err(error) = task.result_mut().executed() {
                    warn!(task = %task.name(), error = %error, "Unable to settle result");
                }
                Self::conclude(task, mode, pending)
            }
            other => other,
        };

        Self::finalize(task);
        outcome.map(|()| task.result().clone())
    }

    fn lifecycle(task: &mut Task, mode: ExecutionMode) -> Result<(), Interrupt> {
        let pending = match Self::guarded(task) {
            Ok(()) => None,
            Err(Interrupt::UndefinedWork { task: name }) => {
                Self::record_undefined_work(task, &name);
                return Err(Interrupt::UndefinedWork { task: name });
            }
            Err(interrupt) => Self::absorb(task, interrupt, mode),
        };

        Self::post_execution(task);
        Self::conclude(task, mode, pending)
    }

    /// Validation and work, including retries
    fn guarded(task: &mut Task) -> Result<(), Interrupt> {
        let definition = task.definition().clone();
        definition
            .callbacks()
            .invoke(CallbackType::BeforeValidation, task)?;

        if !Self::validate(task)? {
            return Ok(());
        }

        let repeator = Repeator::new(&definition.settings().retry);
        loop {
            definition
                .callbacks()
                .invoke(CallbackType::BeforeExecution, task)?;
            task.result_mut().start()?;

            let handler = task.handler().clone();
            match handler.work(task) {
                Err(Interrupt::Raised(error)) if repeator.should_retry(task, &error) => continue,
                outcome => return outcome,
            }
        }
    }

    /// Resolve attributes; on errors fail the result and report `false`
    fn validate(task: &mut Task) -> Result<bool, Interrupt> {
        value::resolve_all(task);
        if task.errors().is_empty() {
            return Ok(true);
        }

        let reason = task.errors().to_string();
        let mut details = Map::new();
        details.insert(metadata::MESSAGES.to_string(), task.errors().to_json());
        debug!(task = %task.name(), errors = %reason, "Attribute validation failed");
        task.result_mut().fail_with(reason, details)?;
        Ok(false)
    }

    /// Classify an interrupt into the result; returns what strict mode should re-raise
    fn absorb(task: &mut Task, interrupt: Interrupt, mode: ExecutionMode) -> Option<Interrupt> {
        match interrupt {
            Interrupt::Fault(fault) => {
                if fault.result().task_id() != task.id() {
                    if let Err(error) = task.result_mut().throw(fault.result()) {
                        warn!(task = %task.name(), error = %error, "Unable to adopt fault");
                    }
                }
                None
            }
            Interrupt::Raised(error) => {
                if let Err(transition) = task.result_mut().fail_from(&error) {
                    warn!(task = %task.name(), error = %transition, "Unable to record raised error");
                }
                if let Some(handler) = task.settings().exception_handler.clone() {
                    handler(task, &error);
                }
                (mode == ExecutionMode::Strict).then_some(Interrupt::Raised(error))
            }
            Interrupt::UndefinedWork { task: name } => {
                Self::record_undefined_work(task, &name);
                Some(Interrupt::UndefinedWork { task: name })
            }
        }
    }

    fn record_undefined_work(task: &mut Task, name: &str) {
        let reason = task.translate(
            locale_keys::FAULT_UNDEFINED_WORK,
            &[("task", name.to_string())],
        );
        let settled = task
            .result_mut()
            .fail(reason)
            .and_then(|_| task.result_mut().executed());
        if let Err(error) = settled {
            warn!(task = %task.name(), error = %error, "Unable to record undefined work");
        }
    }

    /// Pending interrupt, or a fault when strict mode hits a breakpoint status
    fn conclude(
        task: &Task,
        mode: ExecutionMode,
        pending: Option<Interrupt>,
    ) -> Result<(), Interrupt> {
        match pending {
            Some(interrupt) => Err(interrupt),
            None if mode == ExecutionMode::Strict
                && task.settings().is_breakpoint(task.result().status()) =>
            {
                Err(Fault::new(task.result().clone()).into())
            }
            None => Ok(()),
        }
    }

    fn post_execution(task: &mut Task) {
        if let Err(error) = task.result_mut().executed() {
            warn!(task = %task.name(), error = %error, "Unable to settle result");
        }

        let result = task.result();
        let status = result.status();
        let mut sequence = Vec::with_capacity(4);
        sequence.extend(CallbackType::for_state(result.state()));
        if result.is_executed() {
            sequence.push(CallbackType::OnExecuted);
        }
        sequence.push(CallbackType::for_status(status));
        sequence.push(CallbackType::for_outcome(status));

        let definition = task.definition().clone();
        for callback_type in sequence {
            if let Err(interrupt) = definition.callbacks().invoke(callback_type, task) {
                logging::log_error(
                    "worker",
                    &format!("{callback_type} callback"),
                    &interrupt.to_string(),
                    Some(task.name()),
                );
            }
        }
    }

    fn finalize(task: &mut Task) {
        let definition = task.definition().clone();
        let settings = definition.settings();

        if settings.seal_results {
            task.seal();
        }
        if let Err(error) = task.chain().record(task.result()) {
            warn!(task = %task.name(), error = %error, "Unable to record chain entry");
        }
        if settings.seal_results && task.result().is_top_level() {
            task.context().seal();
            task.chain().seal();
        }

        logging::emit(settings.log_level, task.result());

        if !task.result().is_executed() {
            return;
        }
        if let Some(registry) = settings.events.as_ref() {
            let payload = task.result().to_json();
            registry.publish(events::TASK_EXECUTED, &payload);
            registry.publish(&format!("task.{}", task.result().status()), &payload);
        }
    }
}
