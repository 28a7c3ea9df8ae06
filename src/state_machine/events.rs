use serde::{Deserialize, Serialize};

/// Events that can trigger result state transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ResultEvent {
    /// The task's own work is about to run
    Start,
    /// Work returned normally
    Complete,
    /// Halt without changing the status
    Interrupt,
    /// Halt with a skipped status and the given reason
    Skip(String),
    /// Halt with a failed status and the given reason
    Fail(String),
}

impl ResultEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
            Self::Interrupt => "interrupt",
            Self::Skip(_) => "skip",
            Self::Fail(_) => "fail",
        }
    }

    /// Extract the reason if this event carries one
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Skip(reason) | Self::Fail(reason) => Some(reason),
            _ => None,
        }
    }

    /// Check if this event represents a terminal transition
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_metadata() {
        assert_eq!(ResultEvent::Start.event_type(), "start");
        assert_eq!(ResultEvent::Fail("boom".into()).reason(), Some("boom"));
        assert_eq!(ResultEvent::Complete.reason(), None);
        assert!(ResultEvent::Skip("later".into()).is_terminal());
        assert!(!ResultEvent::Start.is_terminal());
    }
}
