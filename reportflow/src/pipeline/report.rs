//! The summary of a finished run.

use crate::context::RunContext;
use crate::core::{Severity, SeverityCounts, StageNumber};
use crate::incidents::ErrorRecord;
use crate::stages::StageResult;
use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// The run's execution id.
    pub execution_id: Uuid,
    /// Pipeline name.
    pub pipeline: String,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run finished.
    pub finished_at: Timestamp,
    /// Wall time in milliseconds.
    pub duration_ms: f64,
    /// Results of every stage the lifecycle saw, ascending.
    pub stages: Vec<StageResult>,
    /// Whether a Fatal incident ended the run early.
    pub aborted: bool,
    /// The stage after whose stop the run aborted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aborted_at: Option<StageNumber>,
    /// Stages of the bound that were never started.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub not_attempted: Vec<StageNumber>,
    /// Run-wide tracked incidents by severity.
    pub totals: SeverityCounts,
    /// Every Error and Fatal incident.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ErrorRecord>,
}

impl RunReport {
    /// Builds the report from a finished context.
    #[must_use]
    pub fn from_context(
        ctx: &RunContext,
        aborted_at: Option<StageNumber>,
        not_attempted: Vec<StageNumber>,
    ) -> Self {
        let finished_at = now_utc();
        let duration_ms = (finished_at - ctx.started_at())
            .to_std()
            .map_or(0.0, |d| d.as_secs_f64() * 1000.0);
        Self {
            execution_id: ctx.execution_id(),
            pipeline: ctx.config().name.clone(),
            started_at: ctx.started_at(),
            finished_at,
            duration_ms,
            stages: ctx.results().values().cloned().collect(),
            aborted: aborted_at.is_some(),
            aborted_at,
            not_attempted,
            totals: ctx.totals(),
            errors: ctx.errors().to_vec(),
        }
    }

    /// Returns the result of one stage.
    #[must_use]
    pub fn stage(&self, number: u32) -> Option<&StageResult> {
        self.stages.iter().find(|r| r.number == StageNumber(number))
    }

    /// Returns the numbers of stages whose handlers were attempted.
    #[must_use]
    pub fn attempted(&self) -> Vec<StageNumber> {
        self.stages
            .iter()
            .filter(|r| !r.skipped)
            .map(|r| r.number)
            .collect()
    }

    /// Returns true if no stage failed and the run was not aborted.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        !self.aborted && self.stages.iter().all(|r| !r.is_failed())
    }

    /// Highest severity tracked in the run.
    #[must_use]
    pub fn worst_severity(&self) -> Option<Severity> {
        Severity::ALL
            .iter()
            .rev()
            .copied()
            .find(|s| self.totals.get(*s) > 0)
    }

    /// Process exit code: 0 clean, 1 errors, 2 aborted.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        if self.aborted {
            2
        } else if self.is_clean() && self.errors.is_empty() {
            0
        } else {
            1
        }
    }
}
