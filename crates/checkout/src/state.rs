//! Checkout attempt state machine.

use serde::{Deserialize, Serialize};

/// The state of a checkout attempt in its lifecycle.
///
/// State transitions:
/// ```text
/// NotStarted ──► Running ──┬──► Completed
///                          └──► Compensating ──► Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum AttemptState {
    /// Attempt has not started yet.
    #[default]
    NotStarted,

    /// Settlement steps are being executed.
    Running,

    /// A step failed and compensating actions are in progress.
    Compensating,

    /// Sale committed, stock decremented, cart cleared (terminal state).
    Completed,

    /// Compensation finished after a failure (terminal state).
    Failed,
}

impl AttemptState {
    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, AttemptState::Completed | AttemptState::Failed)
    }

    /// Returns the state name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttemptState::NotStarted => "NotStarted",
            AttemptState::Running => "Running",
            AttemptState::Compensating => "Compensating",
            AttemptState::Completed => "Completed",
            AttemptState::Failed => "Failed",
        }
    }
}

impl std::fmt::Display for AttemptState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_state_is_not_started() {
        assert_eq!(AttemptState::default(), AttemptState::NotStarted);
    }

    #[test]
    fn terminal_states() {
        assert!(!AttemptState::NotStarted.is_terminal());
        assert!(!AttemptState::Running.is_terminal());
        assert!(!AttemptState::Compensating.is_terminal());
        assert!(AttemptState::Completed.is_terminal());
        assert!(AttemptState::Failed.is_terminal());
    }

    #[test]
    fn display_names() {
        assert_eq!(AttemptState::Running.to_string(), "Running");
        assert_eq!(AttemptState::Compensating.to_string(), "Compensating");
    }

    #[test]
    fn serialization_roundtrip() {
        let state = AttemptState::Compensating;
        let json = serde_json::to_string(&state).unwrap();
        let back: AttemptState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, back);
    }
}
