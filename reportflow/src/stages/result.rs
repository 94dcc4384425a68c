//! Per-stage results collected during a run.

use crate::core::{SeverityCounts, StageNumber, StageState};
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};

/// What happened to one stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage number.
    pub number: StageNumber,
    /// Stage name.
    pub name: String,
    /// Final lifecycle state.
    pub state: StageState,
    /// Whether the stage was skipped on request.
    pub skipped: bool,
    /// Whether the stage finished without Error or Fatal incidents.
    pub success: bool,
    /// When the execution window opened.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<Timestamp>,
    /// When the execution window closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<Timestamp>,
    /// Window duration in milliseconds.
    #[serde(default)]
    pub duration_ms: f64,
    /// Tracked incidents by severity.
    #[serde(default)]
    pub counts: SeverityCounts,
    /// Summary lines written during the stage.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub summary: Vec<String>,
    /// `SaveName` of the manifest written at stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,
    /// Handler data.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,
    /// Handler error messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl StageResult {
    /// Creates the result of a stage that was skipped on request.
    #[must_use]
    pub fn skipped(number: StageNumber, name: impl Into<String>) -> Self {
        Self {
            number,
            name: name.into(),
            state: StageState::Completed,
            skipped: true,
            success: false,
            started_at: None,
            finished_at: None,
            duration_ms: 0.0,
            counts: SeverityCounts::default(),
            summary: Vec::new(),
            manifest: None,
            data: serde_json::Value::Null,
            errors: Vec::new(),
        }
    }

    /// Returns true if the stage ran and failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        !self.skipped && !self.success
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_skipped_result() {
        let result = StageResult::skipped(StageNumber(30), "Transform");
        assert!(result.skipped);
        assert!(!result.success);
        assert!(!result.is_failed());
        assert_eq!(result.state, StageState::Completed);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["skipped"], true);
        assert_eq!(json["number"], 30);
        assert!(json.get("data").is_none());
    }
}
