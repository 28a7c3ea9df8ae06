//! # Task Result
//!
//! Outcome record for one task invocation. The worker and the task's own
//! outcome calls drive it through [`ResultEvent`]s; every transition is
//! checked against the lifecycle table in `determine_target_state` and
//! rejected once the result has been sealed.

use super::{events::ResultEvent, states::TaskState, states::TaskStatus};
use crate::constants::{metadata as keys, DEFAULT_FAULT_REASON};
use crate::context::Context;
use crate::error::{Result, RuntimeError};
use crate::orchestration::errors::RaisedError;
use serde::Serialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    task_id: Uuid,
    task_name: String,
    chain_id: Uuid,
    index: usize,
    state: TaskState,
    status: TaskStatus,
    metadata: Map<String, Value>,
    tags: Vec<String>,
    #[serde(skip)]
    cause: Option<RaisedError>,
    #[serde(skip)]
    context: Context,
    #[serde(skip)]
    sealed: bool,
}

impl TaskResult {
    pub fn new(
        task_id: Uuid,
        task_name: impl Into<String>,
        chain_id: Uuid,
        index: usize,
        context: Context,
    ) -> Self {
        Self {
            task_id,
            task_name: task_name.into(),
            chain_id,
            index,
            state: TaskState::default(),
            status: TaskStatus::default(),
            metadata: Map::new(),
            tags: Vec::new(),
            cause: None,
            context,
            sealed: false,
        }
    }

    pub(crate) fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn task_name(&self) -> &str {
        &self.task_name
    }

    pub fn chain_id(&self) -> Uuid {
        self.chain_id
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> TaskState {
        self.state
    }

    pub fn status(&self) -> TaskStatus {
        self.status
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// The error that failed this result, when one was raised
    pub fn cause(&self) -> Option<&RaisedError> {
        self.cause.as_ref()
    }

    pub fn reason(&self) -> Option<&str> {
        self.metadata.get(keys::REASON).and_then(Value::as_str)
    }

    /// Per-attribute validation messages recorded by a failed pre-validation
    pub fn messages(&self) -> Option<&Map<String, Value>> {
        self.metadata.get(keys::MESSAGES).and_then(Value::as_object)
    }

    pub fn retries(&self) -> u32 {
        self.metadata
            .get(keys::RETRIES)
            .and_then(Value::as_u64)
            .map_or(0, |n| n as u32)
    }

    pub fn is_top_level(&self) -> bool {
        self.index == 0
    }

    pub fn is_initialized(&self) -> bool {
        self.state == TaskState::Initialized
    }

    pub fn is_executing(&self) -> bool {
        self.state == TaskState::Executing
    }

    pub fn is_complete(&self) -> bool {
        self.state == TaskState::Complete
    }

    pub fn is_interrupted(&self) -> bool {
        self.state == TaskState::Interrupted
    }

    /// Work ran to completion or the task was halted with an outcome
    pub fn is_executed(&self) -> bool {
        self.state.is_terminal()
    }

    pub fn is_success(&self) -> bool {
        self.status == TaskStatus::Success
    }

    pub fn is_skipped(&self) -> bool {
        self.status == TaskStatus::Skipped
    }

    pub fn is_failed(&self) -> bool {
        self.status == TaskStatus::Failed
    }

    pub fn is_good(&self) -> bool {
        self.status.is_good()
    }

    pub fn is_bad(&self) -> bool {
        self.status.is_bad()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    pub(crate) fn seal(&mut self) {
        self.sealed = true;
    }

    /// Apply a lifecycle event, returning the resulting state
    pub fn transition(&mut self, event: ResultEvent) -> Result<TaskState> {
        self.ensure_unsealed()?;

        let target = self.determine_target_state(&event)?;
        match &event {
            ResultEvent::Skip(reason) => self.halt_with(TaskStatus::Skipped, reason)?,
            ResultEvent::Fail(reason) => self.halt_with(TaskStatus::Failed, reason)?,
            _ => {}
        }

        self.state = target;
        Ok(target)
    }

    fn determine_target_state(&self, event: &ResultEvent) -> Result<TaskState> {
        let target = match (self.state, event) {
            // Retries re-enter work while already executing
            (TaskState::Initialized | TaskState::Executing, ResultEvent::Start) => {
                TaskState::Executing
            }

            (TaskState::Executing | TaskState::Complete, ResultEvent::Complete) => {
                TaskState::Complete
            }

            (
                TaskState::Initialized | TaskState::Executing | TaskState::Interrupted,
                ResultEvent::Interrupt | ResultEvent::Skip(_) | ResultEvent::Fail(_),
            ) => TaskState::Interrupted,

            (from_state, _) => {
                return Err(RuntimeError::invalid_transition(
                    "result",
                    from_state,
                    event.event_type(),
                ))
            }
        };

        debug_assert!(target.rank() >= self.state.rank());
        Ok(target)
    }

    fn halt_with(&mut self, status: TaskStatus, reason: &str) -> Result<()> {
        if self.status == status {
            return Ok(());
        }
        if self.status != TaskStatus::Success {
            return Err(RuntimeError::invalid_transition(
                "status",
                self.status,
                status,
            ));
        }

        let reason = if reason.trim().is_empty() {
            DEFAULT_FAULT_REASON
        } else {
            reason
        };
        self.status = status;
        self.metadata
            .insert(keys::REASON.to_string(), Value::String(reason.to_string()));
        Ok(())
    }

    pub fn start(&mut self) -> Result<TaskState> {
        self.transition(ResultEvent::Start)
    }

    pub fn skip(&mut self, reason: impl Into<String>) -> Result<TaskState> {
        self.transition(ResultEvent::Skip(reason.into()))
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<TaskState> {
        self.transition(ResultEvent::Fail(reason.into()))
    }

    /// Fail and merge extra metadata alongside the reason
    pub fn fail_with(
        &mut self,
        reason: impl Into<String>,
        metadata: Map<String, Value>,
    ) -> Result<TaskState> {
        let state = self.fail(reason)?;
        self.metadata
            .extend(metadata.into_iter().filter(|(key, _)| key != keys::REASON));
        Ok(state)
    }

    /// Fail from a raised error, keeping it as the cause
    pub fn fail_from(&mut self, error: &RaisedError) -> Result<TaskState> {
        let state = self.fail(error.reason())?;
        self.metadata.insert(
            keys::CAUSE.to_string(),
            json!({ "kind": error.kind(), "message": error.message() }),
        );
        self.cause = Some(error.clone());
        Ok(state)
    }

    /// Complete when still successful, otherwise make sure the state is interrupted
    pub fn executed(&mut self) -> Result<TaskState> {
        match (self.status, self.state) {
            (_, TaskState::Complete | TaskState::Interrupted) => Ok(self.state),
            (TaskStatus::Success, TaskState::Executing) => self.transition(ResultEvent::Complete),
            (TaskStatus::Success, TaskState::Initialized) => Ok(self.state),
            _ => self.transition(ResultEvent::Interrupt),
        }
    }

    /// Adopt the outcome of another (usually nested) result
    pub fn throw(&mut self, other: &TaskResult) -> Result<TaskState> {
        self.ensure_unsealed()?;
        if other.is_success() {
            return Ok(self.state);
        }

        let reason = other.reason().unwrap_or(DEFAULT_FAULT_REASON).to_string();
        match other.status {
            TaskStatus::Skipped => self.skip(reason)?,
            _ => self.fail(reason)?,
        };

        for key in [keys::MESSAGES, keys::CAUSE] {
            if let Some(value) = other.metadata.get(key) {
                self.metadata.insert(key.to_string(), value.clone());
            }
        }
        let caused = other
            .metadata
            .get(keys::CAUSED_FAILURE)
            .cloned()
            .unwrap_or_else(|| other.summary());
        self.metadata
            .insert(keys::CAUSED_FAILURE.to_string(), caused);
        self.metadata
            .insert(keys::THREW_FAILURE.to_string(), other.summary());
        if self.cause.is_none() {
            self.cause = other.cause.clone();
        }
        Ok(self.state)
    }

    pub fn insert_metadata(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Result<()> {
        self.ensure_unsealed()?;
        self.metadata.insert(key.into(), value.into());
        Ok(())
    }

    /// Short identity of this result used for failure provenance
    pub fn summary(&self) -> Value {
        json!({
            "task_id": self.task_id,
            "task_name": self.task_name,
            "index": self.index,
            "status": self.status,
        })
    }

    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn ensure_unsealed(&self) -> Result<()> {
        if self.sealed {
            Err(RuntimeError::Sealed("result"))
        } else {
            Ok(())
        }
    }
}
