//! # Interrupts
//!
//! Everything that can stop a task's work early. Work returns
//! `Result<(), Interrupt>` and the worker's catch logic is a match over the
//! three variants:
//!
//! - [`Fault`]: an already classified outcome (skip, fail, or a nested
//!   task's result being thrown upward)
//! - `UndefinedWork`: the handler never implemented its work
//! - [`RaisedError`]: any other error, eligible for retry
//!
//! `Interrupt` does not implement `std::error::Error`, so every
//! `std::error::Error` converts into it through `?`.

use crate::state_machine::{TaskResult, TaskStatus};
use std::fmt;
use std::sync::Arc;

/// A generic error raised from a task's work
#[derive(Debug, Clone)]
pub struct RaisedError {
    kind: String,
    error: Arc<anyhow::Error>,
}

impl RaisedError {
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            kind: short_type_name::<E>().to_string(),
            error: Arc::new(anyhow::Error::new(error)),
        }
    }

    /// Wrap an `anyhow::Error`. The concrete type is erased, so the kind is `Error`.
    pub fn from_anyhow(error: anyhow::Error) -> Self {
        Self {
            kind: "Error".to_string(),
            error: Arc::new(error),
        }
    }

    /// Raise an ad-hoc error with an explicit kind name
    pub fn with_kind(kind: impl Into<String>, message: impl fmt::Display) -> Self {
        Self {
            kind: kind.into(),
            error: Arc::new(anyhow::anyhow!("{message}")),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn message(&self) -> String {
        self.error.to_string()
    }

    pub fn error(&self) -> &anyhow::Error {
        &self.error
    }

    /// Whether the wrapped error is of type `E`
    pub fn is<E>(&self) -> bool
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.error.is::<E>()
    }

    /// `"[Kind] message"`, the reason recorded on a failed result
    pub fn reason(&self) -> String {
        format!("[{}] {}", self.kind, self.message())
    }
}

impl fmt::Display for RaisedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason())
    }
}

/// A classified outcome travelling up the call stack
#[derive(Debug, Clone)]
pub struct Fault {
    result: Box<TaskResult>,
}

impl Fault {
    pub fn new(result: TaskResult) -> Self {
        Self {
            result: Box::new(result),
        }
    }

    pub fn result(&self) -> &TaskResult {
        &self.result
    }

    pub fn into_result(self) -> TaskResult {
        *self.result
    }

    pub fn status(&self) -> TaskStatus {
        self.result.status()
    }

    pub fn reason(&self) -> Option<&str> {
        self.result.reason()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: {}",
            self.result.task_name(),
            self.status(),
            self.reason().unwrap_or(crate::constants::DEFAULT_FAULT_REASON)
        )
    }
}

/// Why a task's work stopped early
#[derive(Debug, Clone)]
pub enum Interrupt {
    Fault(Fault),
    UndefinedWork { task: String },
    Raised(RaisedError),
}

impl Interrupt {
    /// Raise an ad-hoc error with an explicit kind name
    pub fn raise(kind: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Raised(RaisedError::with_kind(kind, message))
    }

    pub fn from_anyhow(error: anyhow::Error) -> Self {
        Self::Raised(RaisedError::from_anyhow(error))
    }

    pub fn undefined_work(task: impl Into<String>) -> Self {
        Self::UndefinedWork { task: task.into() }
    }

    pub fn as_fault(&self) -> Option<&Fault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }

    pub fn as_raised(&self) -> Option<&RaisedError> {
        match self {
            Self::Raised(error) => Some(error),
            _ => None,
        }
    }

    pub fn is_undefined_work(&self) -> bool {
        matches!(self, Self::UndefinedWork { .. })
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault(fault) => write!(f, "{fault}"),
            Self::UndefinedWork { task } => write!(f, "undefined work for {task}"),
            Self::Raised(error) => write!(f, "{error}"),
        }
    }
}

impl From<Fault> for Interrupt {
    fn from(fault: Fault) -> Self {
        Self::Fault(fault)
    }
}

impl From<RaisedError> for Interrupt {
    fn from(error: RaisedError) -> Self {
        Self::Raised(error)
    }
}

impl<E> From<E> for Interrupt
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::Raised(RaisedError::new(error))
    }
}

/// Last path segment of a type name, without generic parameters
pub(crate) fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(input: &str) -> Result<i64, Interrupt> {
        Ok(input.parse::<i64>()?)
    }

    #[test]
    fn test_std_errors_convert_with_kind() {
        let interrupt = parse("abc").unwrap_err();
        let raised = interrupt.as_raised().unwrap();

        assert_eq!(raised.kind(), "ParseIntError");
        assert!(raised.is::<std::num::ParseIntError>());
        assert_eq!(
            raised.reason(),
            "[ParseIntError] invalid digit found in string"
        );
    }

    #[test]
    fn test_ad_hoc_errors_keep_kind() {
        let interrupt = Interrupt::raise("Timeout", "gateway took too long");
        assert_eq!(interrupt.to_string(), "[Timeout] gateway took too long");
        assert!(interrupt.as_fault().is_none());
    }

    #[test]
    fn test_short_type_name_strips_paths_and_generics() {
        assert_eq!(short_type_name::<std::io::Error>(), "Error");
        assert_eq!(short_type_name::<Vec<String>>(), "Vec");
    }
}
