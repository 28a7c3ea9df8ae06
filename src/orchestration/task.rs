//! # Task Instance
//!
//! One invocation of a [`TaskHandler`]: its identity, the shared context
//! handle, the chain it belongs to, attribute errors, the memoized attribute
//! values and the [`TaskResult`] the worker drives.

use super::errors::{Fault, Interrupt};
use super::task_handler::{TaskDefinition, TaskHandler};
use super::settings::Settings;
use super::worker::{ExecutionMode, Worker};
use crate::attributes::{value, Errors};
use crate::chain::Chain;
use crate::context::Context;
use crate::error::{Result, RuntimeError};
use crate::state_machine::TaskResult;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub struct Task {
    id: Uuid,
    handler: Arc<dyn TaskHandler>,
    definition: Arc<TaskDefinition>,
    context: Context,
    chain: Chain,
    errors: Errors,
    attributes: HashMap<String, Option<Value>>,
    result: TaskResult,
    sealed: bool,
}

impl Task {
    /// Top-level task with a fresh chain
    pub fn new(handler: Arc<dyn TaskHandler>, context: impl Into<Context>) -> Result<Self> {
        Self::with_chain(handler, context, &Chain::new())
    }

    /// Task appended to an existing chain
    pub fn with_chain(
        handler: Arc<dyn TaskHandler>,
        context: impl Into<Context>,
        chain: &Chain,
    ) -> Result<Self> {
        let definition = handler.definition();
        let context = context.into();
        let id = Uuid::new_v4();
        let result = chain.append(|chain_id, index| {
            TaskResult::new(id, definition.name(), chain_id, index, context.clone())
                .with_tags(definition.settings().tags.clone())
        })?;

        Ok(Self {
            id,
            handler,
            definition,
            context,
            chain: chain.clone(),
            errors: Errors::new(),
            attributes: HashMap::new(),
            result,
            sealed: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn handler(&self) -> &Arc<dyn TaskHandler> {
        &self.handler
    }

    pub fn definition(&self) -> &Arc<TaskDefinition> {
        &self.definition
    }

    pub fn settings(&self) -> &Settings {
        self.definition.settings()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn chain(&self) -> &Chain {
        &self.chain
    }

    pub fn errors(&self) -> &Errors {
        &self.errors
    }

    pub(crate) fn errors_mut(&mut self) -> &mut Errors {
        &mut self.errors
    }

    pub fn result(&self) -> &TaskResult {
        &self.result
    }

    pub(crate) fn result_mut(&mut self) -> &mut TaskResult {
        &mut self.result
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
        self.result.seal();
    }

    pub fn translate(&self, key: &str, params: &[(&str, String)]) -> String {
        self.settings().locale.translate(key, params)
    }

    /// Record an attribute error by hand, e.g. from a `before_validation` callback
    pub fn add_error(&mut self, attribute: impl Into<String>, message: impl Into<String>) -> Result<()> {
        if self.sealed {
            return Err(RuntimeError::Sealed("errors"));
        }
        self.errors.add(attribute, message);
        Ok(())
    }

    /// Previously resolved value; `None` when unresolved, invalid or null
    pub fn attribute(&self, method_name: &str) -> Option<&Value> {
        self.attributes
            .get(method_name)
            .and_then(Option::as_ref)
            .filter(|value| !value.is_null())
    }

    /// Resolve an attribute on first access, memoizing the outcome
    pub fn resolve_attribute(&mut self, method_name: &str) -> Option<Value> {
        let resolved = match self.attributes.get(method_name) {
            Some(cached) => cached.clone(),
            None => value::resolve_named(self, method_name),
        };
        resolved.filter(|value| !value.is_null())
    }

    pub(crate) fn cached_attribute(&self, method_name: &str) -> Option<Option<Value>> {
        self.attributes.get(method_name).cloned()
    }

    pub(crate) fn cache_attribute(&mut self, method_name: String, value: Option<Value>) {
        self.attributes.insert(method_name, value);
    }

    /// Halt as skipped; return the interrupt from work with `Err(task.skip(..))`
    pub fn skip(&mut self, reason: impl Into<String>) -> Interrupt {
        match self.result.skip(reason) {
            Ok(_) => Fault::new(self.result.clone()).into(),
            Err(error) => error.into(),
        }
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Interrupt {
        self.fail_with(reason, Map::new())
    }

    pub fn fail_with(&mut self, reason: impl Into<String>, metadata: Map<String, Value>) -> Interrupt {
        match self.result.fail_with(reason, metadata) {
            Ok(_) => Fault::new(self.result.clone()).into(),
            Err(error) => error.into(),
        }
    }

    /// Adopt a nested result's bad outcome and halt with it
    pub fn throw(&mut self, other: &TaskResult) -> Interrupt {
        match self.result.throw(other) {
            Ok(_) => Fault::new(self.result.clone()).into(),
            Err(error) => error.into(),
        }
    }

    /// Run a nested task in this task's chain; faults come back as results
    pub fn call(
        &mut self,
        handler: Arc<dyn TaskHandler>,
        context: impl Into<Context>,
    ) -> std::result::Result<TaskResult, Interrupt> {
        let mut nested = Task::with_chain(handler, context, &self.chain)?;
        Worker::run(&mut nested, ExecutionMode::Safe)
    }

    /// Run a nested task in this task's chain; breakpoint statuses come back as `Err`
    pub fn call_strict(
        &mut self,
        handler: Arc<dyn TaskHandler>,
        context: impl Into<Context>,
    ) -> std::result::Result<TaskResult, Interrupt> {
        let mut nested = Task::with_chain(handler, context, &self.chain)?;
        Worker::run(&mut nested, ExecutionMode::Strict)
    }

    pub fn execute(&mut self) -> std::result::Result<TaskResult, Interrupt> {
        Worker::run(self, ExecutionMode::Safe)
    }

    pub fn execute_strict(&mut self) -> std::result::Result<TaskResult, Interrupt> {
        Worker::run(self, ExecutionMode::Strict)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("context", &self.context)
            .field("errors", &self.errors)
            .field("result", &self.result)
            .field("sealed", &self.sealed)
            .finish()
    }
}
