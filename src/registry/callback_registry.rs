//! # Callback Registry
//!
//! Lifecycle hooks declared on a task definition. Callbacks of one type run
//! in registration order; each one may be gated by a [`Guard`].

use crate::orchestration::errors::Interrupt;
use crate::orchestration::guard::Guard;
use crate::orchestration::task::Task;
use crate::state_machine::{TaskState, TaskStatus};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallbackType {
    BeforeValidation,
    BeforeExecution,
    OnComplete,
    OnInterrupted,
    OnExecuted,
    OnSuccess,
    OnSkipped,
    OnFailed,
    OnGood,
    OnBad,
}

impl CallbackType {
    /// Callback fired for a terminal state, if any
    pub fn for_state(state: TaskState) -> Option<Self> {
        match state {
            TaskState::Complete => Some(Self::OnComplete),
            TaskState::Interrupted => Some(Self::OnInterrupted),
            TaskState::Initialized | TaskState::Executing => None,
        }
    }

    pub fn for_status(status: TaskStatus) -> Self {
        match status {
            TaskStatus::Success => Self::OnSuccess,
            TaskStatus::Skipped => Self::OnSkipped,
            TaskStatus::Failed => Self::OnFailed,
        }
    }

    pub fn for_outcome(status: TaskStatus) -> Self {
        if status.is_good() {
            Self::OnGood
        } else {
            Self::OnBad
        }
    }
}

impl fmt::Display for CallbackType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::BeforeValidation => "before_validation",
            Self::BeforeExecution => "before_execution",
            Self::OnComplete => "on_complete",
            Self::OnInterrupted => "on_interrupted",
            Self::OnExecuted => "on_executed",
            Self::OnSuccess => "on_success",
            Self::OnSkipped => "on_skipped",
            Self::OnFailed => "on_failed",
            Self::OnGood => "on_good",
            Self::OnBad => "on_bad",
        };
        f.write_str(name)
    }
}

pub type CallbackFn = Arc<dyn Fn(&mut Task) -> Result<(), Interrupt> + Send + Sync>;

#[derive(Clone)]
pub struct Callback {
    handler: CallbackFn,
    guard: Guard,
}

impl Callback {
    pub fn new(handler: impl Fn(&mut Task) -> Result<(), Interrupt> + Send + Sync + 'static) -> Self {
        Self {
            handler: Arc::new(handler),
            guard: Guard::always(),
        }
    }

    pub fn when(mut self, predicate: impl Fn(&Task) -> bool + Send + Sync + 'static) -> Self {
        self.guard = self.guard.and_when(predicate);
        self
    }

    pub fn unless(mut self, predicate: impl Fn(&Task) -> bool + Send + Sync + 'static) -> Self {
        self.guard = self.guard.and_unless(predicate);
        self
    }

    /// Run the handler if the guard allows it
    pub fn invoke(&self, task: &mut Task) -> Result<(), Interrupt> {
        if self.guard.allows(task) {
            (self.handler)(task)
        } else {
            Ok(())
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callback").field("guard", &self.guard).finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct CallbackRegistry {
    callbacks: HashMap<CallbackType, Vec<Callback>>,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, callback_type: CallbackType, callback: Callback) -> &mut Self {
        self.callbacks.entry(callback_type).or_default().push(callback);
        self
    }

    pub fn callbacks(&self, callback_type: CallbackType) -> &[Callback] {
        self.callbacks
            .get(&callback_type)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.callbacks.values().all(Vec::is_empty)
    }

    /// Run every callback of `callback_type`, stopping at the first interrupt
    pub fn invoke(&self, callback_type: CallbackType, task: &mut Task) -> Result<(), Interrupt> {
        for callback in self.callbacks(callback_type) {
            callback.invoke(task)?;
        }
        Ok(())
    }
}
