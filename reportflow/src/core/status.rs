//! Stage lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a stage is in its lifecycle.
///
/// `NotStarted -> Active -> Completed` for executed stages and
/// `NotStarted -> Skipped -> Completed` for skipped ones. A skipped stage
/// never becomes `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageState {
    /// The stage has not been touched yet.
    #[default]
    NotStarted,
    /// The stage's execution window is open.
    Active,
    /// The stage was skipped on request.
    Skipped,
    /// The stage's execution window is closed.
    Completed,
}

impl fmt::Display for StageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Active => write!(f, "active"),
            Self::Skipped => write!(f, "skipped"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl StageState {
    /// Returns true once the stage can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if `next` is a legal transition from `self`.
    #[must_use]
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Active | Self::Skipped)
                | (Self::Active | Self::Skipped, Self::Completed)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_state_display() {
        assert_eq!(StageState::NotStarted.to_string(), "not_started");
        assert_eq!(StageState::Skipped.to_string(), "skipped");
    }

    #[test]
    fn test_stage_state_transitions() {
        assert!(StageState::NotStarted.can_transition_to(StageState::Active));
        assert!(StageState::NotStarted.can_transition_to(StageState::Skipped));
        assert!(StageState::Active.can_transition_to(StageState::Completed));
        assert!(StageState::Skipped.can_transition_to(StageState::Completed));
        assert!(!StageState::Skipped.can_transition_to(StageState::Active));
        assert!(!StageState::Completed.can_transition_to(StageState::Active));
    }

    #[test]
    fn test_stage_state_serialize() {
        let json = serde_json::to_string(&StageState::NotStarted).unwrap();
        assert_eq!(json, r#""not_started""#);
        assert!(StageState::Completed.is_terminal());
    }
}
