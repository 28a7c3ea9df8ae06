//! # Middleware
//!
//! Wrappers around a task's whole lifecycle. Middlewares run in declaration
//! order, outermost first; each receives a [`Next`] continuation and decides
//! whether (and how often) to run the rest of the stack.

use super::errors::Interrupt;
use super::task::Task;
use crate::constants::metadata;
use std::time::Instant;
use tracing::warn;

pub trait Middleware: Send + Sync {
    fn call(&self, task: &mut Task, next: &mut Next<'_>) -> Result<(), Interrupt>;

    fn name(&self) -> &str {
        "middleware"
    }
}

impl<F> Middleware for F
where
    F: Fn(&mut Task, &mut Next<'_>) -> Result<(), Interrupt> + Send + Sync,
{
    fn call(&self, task: &mut Task, next: &mut Next<'_>) -> Result<(), Interrupt> {
        self(task, next)
    }
}

type Terminal<'a> = dyn FnMut(&mut Task) -> Result<(), Interrupt> + 'a;

/// Continuation over the remaining middlewares and the lifecycle itself
pub struct Next<'a> {
    middlewares: &'a [std::sync::Arc<dyn Middleware>],
    terminal: &'a mut Terminal<'a>,
}

impl<'a> Next<'a> {
    pub(crate) fn new(
        middlewares: &'a [std::sync::Arc<dyn Middleware>],
        terminal: &'a mut Terminal<'a>,
    ) -> Self {
        Self {
            middlewares,
            terminal,
        }
    }

    /// Run the rest of the stack; may be invoked more than once
    pub fn run(&mut self, task: &mut Task) -> Result<(), Interrupt> {
        match self.middlewares.split_first() {
            Some((first, rest)) => {
                let mut next = Next {
                    middlewares: rest,
                    terminal: &mut *self.terminal,
                };
                first.call(task, &mut next)
            }
            None => (self.terminal)(task),
        }
    }

    pub fn remaining(&self) -> usize {
        self.middlewares.len()
    }
}

/// Tags the result with a correlation id shared by the whole chain
#[derive(Debug, Clone, Default)]
pub struct Correlate {
    id: Option<String>,
}

impl Correlate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed id instead of the chain id
    pub fn with_id(id: impl Into<String>) -> Self {
        Self { id: Some(id.into()) }
    }
}

impl Middleware for Correlate {
    fn call(&self, task: &mut Task, next: &mut Next<'_>) -> Result<(), Interrupt> {
        let id = self
            .id
            .clone()
            .unwrap_or_else(|| task.chain().id().to_string());
        task.result_mut()
            .insert_metadata(metadata::CORRELATION_ID, id)?;
        next.run(task)
    }

    fn name(&self) -> &str {
        "correlate"
    }
}

/// Records the lifecycle's wall time in milliseconds
#[derive(Debug, Clone, Copy, Default)]
pub struct Runtime;

impl Middleware for Runtime {
    fn call(&self, task: &mut Task, next: &mut Next<'_>) -> Result<(), Interrupt> {
        let started = Instant::now();
        let outcome = next.run(task);
        let elapsed = started.elapsed().as_millis() as u64;
        if let Err(error) = task.result_mut().insert_metadata(metadata::RUNTIME_MS, elapsed) {
            warn!(task = %task.name(), error = %error, "Unable to record runtime");
        }
        outcome
    }

    fn name(&self) -> &str {
        "runtime"
    }
}
