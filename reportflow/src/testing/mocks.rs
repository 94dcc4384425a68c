//! Mock stage handlers for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use crate::context::RunContext;
use crate::core::{StageNumber, StageOutcome};
use crate::incidents::IncidentReport;
use crate::stages::StageHandler;

/// Shared, ordered record of handler invocations.
pub type CallLog = Arc<Mutex<Vec<String>>>;

/// Creates an empty call log.
#[must_use]
pub fn call_log() -> CallLog {
    Arc::new(Mutex::new(Vec::new()))
}

/// A handler that records calls and returns a configurable outcome.
///
/// When the stage has an output manifest, the configured data entries are
/// written into it.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    outcome: Mutex<StageOutcome>,
    output_data: Vec<(String, serde_json::Value)>,
    reports: Vec<IncidentReport>,
    calls: Mutex<Vec<Option<StageNumber>>>,
    log: Option<CallLog>,
}

impl RecordingStage {
    /// Creates a recording handler that succeeds.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: Mutex::new(StageOutcome::ok()),
            output_data: Vec::new(),
            reports: Vec::new(),
            calls: Mutex::new(Vec::new()),
            log: None,
        }
    }

    /// Appends the stage name to `log` on every call.
    #[must_use]
    pub fn with_log(mut self, log: CallLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Sets the outcome to return.
    #[must_use]
    pub fn with_outcome(self, outcome: StageOutcome) -> Self {
        *self.outcome.lock() = outcome;
        self
    }

    /// Writes `key = value` into the output manifest on every call.
    #[must_use]
    pub fn with_output_data(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.output_data.push((key.into(), value));
        self
    }

    /// Registers `report` on every call.
    #[must_use]
    pub fn with_report(mut self, report: IncidentReport) -> Self {
        self.reports.push(report);
        self
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Returns the active stage number seen on each call.
    #[must_use]
    pub fn calls(&self) -> Vec<Option<StageNumber>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl StageHandler for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StageOutcome> {
        self.calls
            .lock()
            .push(ctx.current_stage().map(|d| d.number));
        if let Some(ref log) = self.log {
            log.lock().push(self.name.clone());
        }
        for report in &self.reports {
            ctx.register(report.clone());
        }
        if let Some(out) = ctx.manifest_out_mut() {
            for (key, value) in &self.output_data {
                out.set_data(key.clone(), value.clone());
            }
        }
        Ok(self.outcome.lock().clone())
    }
}

/// A handler that always returns an error.
#[derive(Debug)]
pub struct FailingStage {
    name: String,
    error: String,
}

impl FailingStage {
    /// Creates a failing handler.
    #[must_use]
    pub fn new(name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            error: error.into(),
        }
    }
}

#[async_trait]
impl StageHandler for FailingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, _ctx: &mut RunContext) -> anyhow::Result<StageOutcome> {
        Err(anyhow::anyhow!("{}", self.error))
    }
}

/// A handler that always panics.
#[derive(Debug)]
pub struct PanickingStage {
    name: String,
    message: String,
}

impl PanickingStage {
    /// Creates a panicking handler.
    #[must_use]
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            message: message.into(),
        }
    }
}

#[async_trait]
impl StageHandler for PanickingStage {
    fn name(&self) -> &str {
        &self.name
    }

    #[allow(clippy::panic)]
    async fn execute(&self, _ctx: &mut RunContext) -> anyhow::Result<StageOutcome> {
        panic!("{}", self.message)
    }
}

/// A handler that registers one incident and returns a fixed outcome.
#[derive(Debug)]
pub struct ErrorReportingStage {
    name: String,
    report: IncidentReport,
    success: bool,
}

impl ErrorReportingStage {
    /// Creates a handler that registers `report` and reports success.
    #[must_use]
    pub fn new(name: impl Into<String>, report: IncidentReport) -> Self {
        Self {
            name: name.into(),
            report,
            success: true,
        }
    }

    /// Makes the handler report failure as well.
    #[must_use]
    pub fn unsuccessful(mut self) -> Self {
        self.success = false;
        self
    }
}

#[async_trait]
impl StageHandler for ErrorReportingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, ctx: &mut RunContext) -> anyhow::Result<StageOutcome> {
        ctx.register(self.report.clone());
        Ok(StageOutcome {
            success: self.success,
            ..StageOutcome::ok()
        })
    }
}
