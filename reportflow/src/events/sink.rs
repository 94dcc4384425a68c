//! Incident sink trait and implementations.

use crate::core::Severity;
use crate::incidents::Incident;
use parking_lot::{Mutex, RwLock};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Destination for incidents that pass the logging threshold.
///
/// Implementations must never fail outward: write errors are reported via
/// `tracing` and swallowed.
#[cfg_attr(test, mockall::automock)]
pub trait IncidentSink: Send + Sync {
    /// Records a tracked incident.
    fn record(&self, incident: &Incident);

    /// Records a plain log message that is not an incident.
    fn log(&self, severity: Severity, message: &str);
}

/// A no-op sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpIncidentSink;

impl IncidentSink for NoOpIncidentSink {
    fn record(&self, _incident: &Incident) {}

    fn log(&self, _severity: Severity, _message: &str) {}
}

/// A sink that logs through the tracing framework.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingIncidentSink;

impl IncidentSink for TracingIncidentSink {
    fn record(&self, incident: &Incident) {
        let execution_id = incident.execution_id.to_string();
        let stage = incident.stage_name.as_str();
        let code = incident.code.as_str();
        let detail = incident.detail.as_deref().unwrap_or("");
        let recommendation = incident.recommendation.as_deref().unwrap_or("");

        match incident.severity {
            Severity::Debug => debug!(
                execution_id, stage, code, detail, recommendation,
                "{}", incident.message
            ),
            Severity::Info => info!(
                execution_id, stage, code, detail, recommendation,
                "{}", incident.message
            ),
            Severity::Warning => warn!(
                execution_id, stage, code, detail, recommendation,
                "{}", incident.message
            ),
            Severity::Error | Severity::Fatal => error!(
                execution_id, stage, code, detail, recommendation,
                severity = %incident.severity,
                "{}", incident.message
            ),
        }
    }

    fn log(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Debug => debug!("{message}"),
            Severity::Info => info!("{message}"),
            Severity::Warning => warn!("{message}"),
            Severity::Error | Severity::Fatal => error!("{message}"),
        }
    }
}

/// A sink that appends one JSON document per line to a per-run file.
///
/// Each record also goes to `tracing`.
#[derive(Debug)]
pub struct JsonLinesIncidentSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesIncidentSink {
    /// Opens (creating or appending) the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory or file cannot be created.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Opens `<dir>/<execution_id>.jsonl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn for_run(dir: impl AsRef<Path>, execution_id: uuid::Uuid) -> std::io::Result<Self> {
        Self::open(dir.as_ref().join(format!("{execution_id}.jsonl")))
    }

    /// Returns the file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &serde_json::Value) {
        let mut file = self.file.lock();
        if let Err(e) = writeln!(file, "{line}") {
            warn!(path = %self.path.display(), error = %e, "Failed to write incident log line");
        }
    }
}

impl IncidentSink for JsonLinesIncidentSink {
    fn record(&self, incident: &Incident) {
        TracingIncidentSink.record(incident);
        match serde_json::to_value(incident) {
            Ok(value) => self.append(&value),
            Err(e) => warn!(error = %e, "Failed to serialize incident"),
        }
    }

    fn log(&self, severity: Severity, message: &str) {
        TracingIncidentSink.log(severity, message);
        self.append(&serde_json::json!({
            "timestamp": crate::utils::iso_timestamp(),
            "severity": severity,
            "message": message,
        }));
    }
}

/// A collecting sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingIncidentSink {
    incidents: RwLock<Vec<Incident>>,
    logs: RwLock<Vec<(Severity, String)>>,
}

impl CollectingIncidentSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected incidents.
    #[must_use]
    pub fn incidents(&self) -> Vec<Incident> {
        self.incidents.read().clone()
    }

    /// Returns all collected plain log messages.
    #[must_use]
    pub fn logs(&self) -> Vec<(Severity, String)> {
        self.logs.read().clone()
    }

    /// Returns collected incidents with the given code.
    #[must_use]
    pub fn incidents_with_code(&self, code: &str) -> Vec<Incident> {
        self.incidents
            .read()
            .iter()
            .filter(|i| i.code == code)
            .cloned()
            .collect()
    }

    /// Clears everything collected.
    pub fn clear(&self) {
        self.incidents.write().clear();
        self.logs.write().clear();
    }
}

impl IncidentSink for CollectingIncidentSink {
    fn record(&self, incident: &Incident) {
        self.incidents.write().push(incident.clone());
    }

    fn log(&self, severity: Severity, message: &str) {
        self.logs.write().push((severity, message.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StageKey;

    fn incident(code: &str, severity: Severity) -> Incident {
        Incident {
            timestamp: crate::utils::now_utc(),
            execution_id: uuid::Uuid::new_v4(),
            stage: StageKey::Orchestrator,
            stage_name: "orchestrator".to_string(),
            severity,
            code: code.to_string(),
            message: "message".to_string(),
            detail: None,
            recommendation: None,
            context: serde_json::Map::new(),
        }
    }

    #[test]
    fn test_noop_and_tracing_sinks() {
        let i = incident("X", Severity::Fatal);
        NoOpIncidentSink.record(&i);
        TracingIncidentSink.record(&i);
        TracingIncidentSink.log(Severity::Warning, "note");
        // Should not panic
    }

    #[test]
    fn test_collecting_sink() {
        let sink = CollectingIncidentSink::new();
        sink.record(&incident("A", Severity::Info));
        sink.record(&incident("B", Severity::Error));
        sink.log(Severity::Warning, "note");

        assert_eq!(sink.incidents().len(), 2);
        assert_eq!(sink.incidents_with_code("B").len(), 1);
        assert_eq!(sink.logs(), vec![(Severity::Warning, "note".to_string())]);

        sink.clear();
        assert!(sink.incidents().is_empty());
        assert!(sink.logs().is_empty());
    }

    #[test]
    fn test_json_lines_sink_appends() {
        let dir = tempfile::tempdir().unwrap();
        let id = uuid::Uuid::new_v4();
        let sink = JsonLinesIncidentSink::for_run(dir.path().join("logs"), id).unwrap();

        sink.record(&incident("A", Severity::Warning));
        sink.log(Severity::Info, "stage summary");

        let text = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<serde_json::Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["code"], "A");
        assert_eq!(lines[1]["message"], "stage summary");
        assert!(sink.path().ends_with(format!("{id}.jsonl")));
    }
}
