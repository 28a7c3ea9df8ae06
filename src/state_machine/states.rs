use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle position of a task invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Result created, nothing has run yet
    #[default]
    Initialized,
    /// The task's own work is running
    Executing,
    /// Work returned normally
    Complete,
    /// Work was halted by a fault, a raised error or a validation failure
    Interrupted,
}

impl TaskState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Interrupted)
    }

    /// Check if this is an active state (work is being processed)
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Executing)
    }

    /// Position in the monotonic lifecycle ordering
    pub(crate) fn rank(&self) -> u8 {
        match self {
            Self::Initialized => 0,
            Self::Executing => 1,
            Self::Complete | Self::Interrupted => 2,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Initialized => write!(f, "initialized"),
            Self::Executing => write!(f, "executing"),
            Self::Complete => write!(f, "complete"),
            Self::Interrupted => write!(f, "interrupted"),
        }
    }
}

impl std::str::FromStr for TaskState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "initialized" => Ok(Self::Initialized),
            "executing" => Ok(Self::Executing),
            "complete" => Ok(Self::Complete),
            "interrupted" => Ok(Self::Interrupted),
            _ => Err(format!("Invalid task state: {s}")),
        }
    }
}

/// Disposition of a task invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    #[default]
    Success,
    Skipped,
    Failed,
}

impl TaskStatus {
    /// Success and skipped outcomes are "good"
    pub fn is_good(&self) -> bool {
        !self.is_bad()
    }

    /// Only failures are "bad"
    pub fn is_bad(&self) -> bool {
        matches!(self, Self::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Skipped => write!(f, "skipped"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(Self::Success),
            "skipped" => Ok(Self::Skipped),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("Invalid task status: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_state_terminal_check() {
        assert!(TaskState::Complete.is_terminal());
        assert!(TaskState::Interrupted.is_terminal());
        assert!(!TaskState::Initialized.is_terminal());
        assert!(!TaskState::Executing.is_terminal());
    }

    #[test]
    fn test_status_good_and_bad() {
        assert!(TaskStatus::Success.is_good());
        assert!(TaskStatus::Skipped.is_good());
        assert!(TaskStatus::Failed.is_bad());
        assert!(!TaskStatus::Skipped.is_bad());
    }

    #[test]
    fn test_state_string_conversion() {
        assert_eq!(TaskState::Interrupted.to_string(), "interrupted");
        assert_eq!(
            "complete".parse::<TaskState>().unwrap(),
            TaskState::Complete
        );
        assert_eq!("skipped".parse::<TaskStatus>().unwrap(), TaskStatus::Skipped);
        assert!("resolved_manually".parse::<TaskState>().is_err());
    }

    #[test]
    fn test_state_serde() {
        let json = serde_json::to_string(&TaskState::Executing).unwrap();
        assert_eq!(json, "\"executing\"");

        let parsed: TaskStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(parsed, TaskStatus::Failed);
    }
}
