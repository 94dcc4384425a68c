//! Stage lifecycle: opening and closing one stage's execution window.
//!
//! ```text
//! NotStarted -> Active  -> Completed
//! NotStarted -> Skipped -> Completed
//! ```
//!
//! [`start`] prepares the context for a stage (input manifest, output
//! skeleton, fresh counters); [`stop`] persists the output, rolls up the
//! stage's incidents into a [`StageResult`] and hands attribution back to
//! the orchestrator.

use crate::context::{ActiveStage, RunContext};
use crate::core::{Severity, StageKey, StageOutcome, StageState};
use crate::incidents::{codes, IncidentReport};
use crate::observability::{emit_stage_rollup, rollup_line, SpanTimer};
use crate::stages::{StageDefinition, StageResult};
use crate::utils::now_utc;
use std::path::Path;
use tracing::debug;

/// What [`start`] did with a stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The stage is active; its handler may run.
    Active,
    /// The stage is skipped; no handler runs.
    Skipped,
}

/// Opens the execution window of `definition`.
///
/// A sequence mismatch is reported and tolerated. A stage in the plan's
/// skip set is recorded as skipped. Otherwise the stage's counters are
/// reset, incidents are attributed to it, the input manifest is loaded
/// (from `explicit_input` if given) and, unless that raised a Fatal, the
/// output skeleton created.
pub fn start(
    ctx: &mut RunContext,
    definition: &StageDefinition,
    explicit_input: Option<&Path>,
) -> StartOutcome {
    let number = definition.number;

    if let Some(expected) = ctx.next_expected {
        if expected != number {
            ctx.register(
                IncidentReport::code(codes::STAGE_SEQUENCE_MISMATCH)
                    .with_detail(format!(
                        "Expected stage {expected}, starting stage {number} ({})",
                        definition.name
                    ))
                    .with_context_entry("expected", expected.get())
                    .with_context_entry("actual", number.get()),
            );
        }
    }

    let skipped = ctx.is_skipped(number);
    ctx.current = Some(ActiveStage {
        definition: definition.clone(),
        state: if skipped {
            StageState::Skipped
        } else {
            StageState::Active
        },
        started_at: now_utc(),
        timer: SpanTimer::start(&definition.name),
        outcome: None,
    });
    ctx.manifest_in = None;
    ctx.manifest_out = None;

    if skipped {
        ctx.register(
            IncidentReport::code(codes::STAGE_SKIPPED)
                .with_detail(format!("Stage {number} ({})", definition.name))
                .with_context_entry("stage", number.get()),
        );
        return StartOutcome::Skipped;
    }

    let key = StageKey::Stage(number);
    ctx.incidents.remove(&key);
    ctx.metrics.remove(&key);
    ctx.has_errors = false;
    ctx.summary.clear();
    ctx.attribution = key;
    ctx.register(IncidentReport::code(codes::STAGE_STARTED).with_detail(definition.name.clone()));

    if let Some(ref input_type) = definition.input_from {
        let store = ctx.store();
        match store.find(ctx, input_type, explicit_input) {
            Some(manifest) => ctx.manifest_in = Some(manifest),
            None => {
                let code = if definition.input_required {
                    codes::INPUT_REQUIRED
                } else {
                    codes::INPUT_MISSING
                };
                ctx.register(
                    IncidentReport::code(code)
                        .with_detail(format!(
                            "No usable '{input_type}' manifest for stage {number} ({})",
                            definition.name
                        ))
                        .with_context_entry("type", input_type.as_str()),
                );
            }
        }
    }

    if definition.has_manifest && !ctx.has_fatal_errors() {
        let manifest = ctx.store().create(ctx, definition);
        ctx.manifest_out = Some(manifest);
    }

    debug!(
        execution_id = %ctx.execution_id(),
        stage = number.get(),
        name = %definition.name,
        "Stage started"
    );
    StartOutcome::Active
}

/// Records the handler's outcome on the active stage.
pub(crate) fn record_outcome(ctx: &mut RunContext, outcome: StageOutcome) {
    if let Some(active) = ctx.current.as_mut() {
        active.outcome = Some(outcome);
    }
}

/// Closes the active stage's execution window.
///
/// Safe to call after a partial [`start`]; does nothing without an active
/// stage. The output manifest is saved only when the handler returned an
/// outcome. Never clears the run's fatal flag.
pub fn stop(ctx: &mut RunContext) {
    ctx.attribution = StageKey::Orchestrator;
    let Some(handled) = ctx.current.as_ref().map(|active| active.outcome.is_some()) else {
        return;
    };

    // Only a handler's work product is persisted.
    let saved_name = if handled { persist_output(ctx) } else { None };
    ctx.manifest_in = None;
    ctx.manifest_out = None;

    let Some(active) = ctx.current.take() else {
        return;
    };
    let definition = active.definition;
    let number = definition.number;
    ctx.next_expected = definition.next_stage;

    if active.state == StageState::Skipped {
        ctx.results
            .insert(number, StageResult::skipped(number, definition.name));
        return;
    }

    let key = StageKey::Stage(number);
    let counts = ctx.metrics(key).copied().unwrap_or_default();
    let outcome = active
        .outcome
        .unwrap_or_else(|| StageOutcome::failed("Handler did not run"));
    let mut result = StageResult {
        number,
        name: definition.name,
        state: StageState::Completed,
        skipped: false,
        success: outcome.success && !ctx.has_errors,
        started_at: Some(active.started_at),
        finished_at: Some(now_utc()),
        duration_ms: active.timer.finish(),
        counts,
        summary: Vec::new(),
        manifest: saved_name,
        data: outcome.data,
        errors: outcome.errors,
    };

    let line = rollup_line(&result);
    emit_stage_rollup(ctx.execution_id(), &result);
    if Severity::Info >= ctx.router().log_level() {
        ctx.sink.log(Severity::Info, &line);
    }
    ctx.summary.push(line);
    result.summary = std::mem::take(&mut ctx.summary);

    ctx.results.insert(number, result);
    ctx.has_errors = false;
}

/// Saves and caches the output manifest; returns its `SaveName`.
fn persist_output(ctx: &mut RunContext) -> Option<String> {
    let mut manifest = ctx.manifest_out.take()?;
    let name = ctx
        .store()
        .save(ctx, &mut manifest)
        .and(manifest.save_name.clone());
    ctx.manifests
        .insert(manifest.manifest_type.clone(), manifest);
    name
}
