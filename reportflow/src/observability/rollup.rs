//! Per-stage and per-run severity rollups.

use crate::pipeline::RunReport;
use crate::stages::StageResult;
use tracing::{info, warn};
use uuid::Uuid;

/// Renders the summary line written when a stage stops.
#[must_use]
pub fn rollup_line(result: &StageResult) -> String {
    format!(
        "Stage {} {} finished in {:.1} ms ({}): {}",
        result.number,
        result.name,
        result.duration_ms,
        if result.success { "ok" } else { "failed" },
        result.counts
    )
}

/// Emits a structured event for a stopped stage.
pub fn emit_stage_rollup(execution_id: Uuid, result: &StageResult) {
    let counts = &result.counts;
    if counts.has_failures() {
        warn!(
            %execution_id,
            stage = result.number.get(),
            name = %result.name,
            duration_ms = result.duration_ms,
            debug = counts.debug,
            info = counts.info,
            warning = counts.warning,
            error = counts.error,
            fatal = counts.fatal,
            "Stage finished with errors"
        );
    } else {
        info!(
            %execution_id,
            stage = result.number.get(),
            name = %result.name,
            duration_ms = result.duration_ms,
            debug = counts.debug,
            info = counts.info,
            warning = counts.warning,
            error = counts.error,
            fatal = counts.fatal,
            "Stage finished"
        );
    }
}

/// Emits a structured event for a finished run.
pub fn emit_run_rollup(report: &RunReport) {
    let attempted = report.stages.iter().filter(|r| !r.skipped).count();
    if report.aborted {
        warn!(
            execution_id = %report.execution_id,
            pipeline = %report.pipeline,
            attempted,
            aborted_at = report.aborted_at.map(|n| n.get()),
            not_attempted = report.not_attempted.len(),
            totals = %report.totals,
            "Run aborted"
        );
    } else {
        info!(
            execution_id = %report.execution_id,
            pipeline = %report.pipeline,
            attempted,
            duration_ms = report.duration_ms,
            totals = %report.totals,
            "Run finished"
        );
    }
}
