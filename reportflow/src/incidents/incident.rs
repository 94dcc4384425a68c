//! Incident records and the reports that produce them.

use crate::core::{Severity, StageKey};
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A request to register an incident.
///
/// Everything except the code is optional: the catalog fills in severity,
/// message and recommendation. `level` is only honoured for reports without
/// a code.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncidentReport {
    /// Catalog code, or `None` for an ad-hoc message.
    pub code: Option<String>,
    /// Severity for ad-hoc reports.
    pub level: Option<Severity>,
    /// Message overriding the catalog default.
    pub message: Option<String>,
    /// Free-form detail.
    pub detail: Option<String>,
    /// Recommendation overriding the catalog default.
    pub recommendation: Option<String>,
    /// The record (file, row, account...) the incident is about.
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl IncidentReport {
    /// Creates a report for a catalog code.
    #[must_use]
    pub fn code(code: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            ..Self::default()
        }
    }

    /// Creates a codeless report with an explicit severity.
    #[must_use]
    pub fn adhoc(level: Severity, message: impl Into<String>) -> Self {
        Self {
            level: Some(level),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Sets the advisory level.
    #[must_use]
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the message.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Sets the detail.
    #[must_use]
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Sets the recommendation.
    #[must_use]
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    /// Adds a single record-context entry.
    #[must_use]
    pub fn with_context_entry(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Adds record-context entries.
    #[must_use]
    pub fn with_context(mut self, context: serde_json::Map<String, serde_json::Value>) -> Self {
        self.context.extend(context);
        self
    }
}

/// An immutable record of a runtime event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// When the incident was registered.
    pub timestamp: Timestamp,
    /// The run that produced it.
    pub execution_id: Uuid,
    /// Stage attribution.
    pub stage: StageKey,
    /// Name of the attributed stage, or `orchestrator`.
    pub stage_name: String,
    /// Effective severity.
    pub severity: Severity,
    /// Catalog code (or [`super::codes::ADHOC`]).
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Free-form detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Remediation hint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
    /// The record the incident is about.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl Incident {
    /// Renders the incident as a single log line.
    #[must_use]
    pub fn log_line(&self) -> String {
        let mut line = format!(
            "{} [{}] {} {}: {}",
            crate::utils::format_iso8601(&self.timestamp),
            self.severity,
            self.stage_name,
            self.code,
            self.message
        );
        if let Some(ref detail) = self.detail {
            line.push_str(" | ");
            line.push_str(detail);
        }
        if let Some(ref recommendation) = self.recommendation {
            line.push_str(" | recommendation: ");
            line.push_str(recommendation);
        }
        line
    }
}

/// Flat error entry derived from every Error or Fatal incident.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// When the incident was registered.
    pub timestamp: Timestamp,
    /// Stage attribution.
    pub stage: StageKey,
    /// Name of the attributed stage.
    pub stage_name: String,
    /// `Error` or `Fatal`.
    pub severity: Severity,
    /// Catalog code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
    /// Free-form detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl From<&Incident> for ErrorRecord {
    fn from(incident: &Incident) -> Self {
        Self {
            timestamp: incident.timestamp,
            stage: incident.stage,
            stage_name: incident.stage_name.clone(),
            severity: incident.severity,
            code: incident.code.clone(),
            message: incident.message.clone(),
            detail: incident.detail.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageNumber;

    fn sample() -> Incident {
        Incident {
            timestamp: crate::utils::now_utc(),
            execution_id: Uuid::new_v4(),
            stage: StageKey::Stage(StageNumber(20)),
            stage_name: "Validate".to_string(),
            severity: Severity::Error,
            code: "VAL-001".to_string(),
            message: "Bad header".to_string(),
            detail: Some("row 1".to_string()),
            recommendation: Some("Fix the header".to_string()),
            context: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_report_builder() {
        let report = IncidentReport::code("VAL-001")
            .with_detail("column 4")
            .with_context_entry("file", "ledger.csv")
            .with_context_entry("row", 12);

        assert_eq!(report.code.as_deref(), Some("VAL-001"));
        assert_eq!(report.detail.as_deref(), Some("column 4"));
        assert_eq!(report.context.get("row"), Some(&serde_json::json!(12)));
    }

    #[test]
    fn test_adhoc_report() {
        let report = IncidentReport::adhoc(Severity::Warning, "slow upload");
        assert!(report.code.is_none());
        assert_eq!(report.level, Some(Severity::Warning));
    }

    #[test]
    fn test_log_line_contains_all_parts() {
        let line = sample().log_line();
        assert!(line.contains("[Error]"));
        assert!(line.contains("Validate VAL-001: Bad header"));
        assert!(line.contains("| row 1"));
        assert!(line.contains("recommendation: Fix the header"));
    }

    #[test]
    fn test_error_record_from_incident() {
        let incident = sample();
        let record = ErrorRecord::from(&incident);
        assert_eq!(record.code, "VAL-001");
        assert_eq!(record.stage, StageKey::Stage(StageNumber(20)));
        assert_eq!(record.severity, Severity::Error);
    }

    #[test]
    fn test_incident_serialization_skips_empty_context() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["stage"], "stage-20");
        assert!(json.get("context").is_none());
    }
}
