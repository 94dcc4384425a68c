//! The orchestrator driver.

use super::{RunPlan, RunReport, RunRequest};
use crate::config::PipelineConfig;
use crate::context::RunContext;
use crate::core::StageNumber;
use crate::events::{IncidentSink, JsonLinesIncidentSink};
use crate::incidents::{codes, IncidentCatalog, IncidentReport};
use crate::lifecycle::{self, StartOutcome};
use crate::observability::{emit_run_rollup, stage_span};
use crate::stages::{StageDefinition, StageRegistry};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, warn, Instrument};

/// Runs the configured stages in ascending order.
///
/// Each stage in the plan's bound goes through `start`, its handler (when
/// active and the run is still healthy) and `stop`. The run aborts after
/// the first `stop` that leaves the fatal flag set.
#[derive(Debug, Clone, Default)]
pub struct Orchestrator {
    registry: StageRegistry,
}

impl Orchestrator {
    /// Creates a driver over `registry`.
    #[must_use]
    pub fn new(registry: StageRegistry) -> Self {
        Self { registry }
    }

    /// Returns the handler registry.
    #[must_use]
    pub fn registry(&self) -> &StageRegistry {
        &self.registry
    }

    /// Creates a context for `config` and runs `request` in it.
    ///
    /// When `config.log_dir` is set, incidents are also written to
    /// `<log_dir>/<execution_id>.jsonl`.
    pub async fn run(
        &self,
        config: Arc<PipelineConfig>,
        catalog: Arc<IncidentCatalog>,
        request: &RunRequest,
    ) -> RunReport {
        let mut ctx = RunContext::new(Arc::clone(&config), catalog);
        if let Some(ref dir) = config.log_dir {
            match JsonLinesIncidentSink::for_run(dir, ctx.execution_id()) {
                Ok(sink) => {
                    let sink: Arc<dyn IncidentSink> = Arc::new(sink);
                    ctx = ctx.with_sink(sink);
                }
                Err(e) => warn!(
                    dir = %dir.display(),
                    error = %e,
                    "Cannot open incident log; logging to tracing only"
                ),
            }
        }
        self.execute(&mut ctx, request).await
    }

    /// Runs `request` in an existing context.
    pub async fn execute(&self, ctx: &mut RunContext, request: &RunRequest) -> RunReport {
        let config = Arc::clone(ctx.config());
        let plan = RunPlan::from_request(&config.stage_numbers(), request);
        ctx.next_expected = plan.first();
        ctx.plan = Some(plan.clone());

        info!(
            execution_id = %ctx.execution_id(),
            pipeline = %config.name,
            run_list = ?plan.run_list().iter().map(|n| n.get()).collect::<Vec<_>>(),
            "Run started"
        );

        let mut aborted_at = None;
        let mut not_attempted = Vec::new();
        for (index, number) in plan.bounded().iter().copied().enumerate() {
            let Some(definition) = config.stage(number) else {
                continue;
            };
            let explicit_input = request.input_paths.get(&number).map(|p| p.as_path());

            if lifecycle::start(ctx, definition, explicit_input) == StartOutcome::Active
                && !ctx.has_fatal_errors()
            {
                self.run_handler(ctx, definition).await;
            }
            lifecycle::stop(ctx);

            if ctx.has_fatal_errors() {
                not_attempted = plan.bounded()[index + 1..].to_vec();
                aborted_at = Some(number);
                abort(ctx, number, &not_attempted);
                break;
            }
        }

        let report = RunReport::from_context(ctx, aborted_at, not_attempted);
        emit_run_rollup(&report);
        report
    }

    async fn run_handler(&self, ctx: &mut RunContext, definition: &StageDefinition) {
        let Some(handler) = self.registry.get(&definition.name) else {
            ctx.register(
                IncidentReport::code(codes::HANDLER_MISSING)
                    .with_detail(format!(
                        "No handler registered for stage {} ({})",
                        definition.number, definition.name
                    )),
            );
            return;
        };

        let span = stage_span(ctx.execution_id(), definition.number, &definition.name);
        let result = AssertUnwindSafe(handler.execute(ctx))
            .catch_unwind()
            .instrument(span)
            .await;

        match result {
            Ok(Ok(outcome)) => {
                if !outcome.success && !ctx.has_errors() {
                    let detail = if outcome.errors.is_empty() {
                        format!("Stage {} reported failure", definition.name)
                    } else {
                        outcome.errors.join("; ")
                    };
                    ctx.register(IncidentReport::code(codes::STAGE_FAILED).with_detail(detail));
                }
                lifecycle::record_outcome(ctx, outcome);
            }
            Ok(Err(err)) => {
                ctx.register(
                    IncidentReport::code(codes::HANDLER_FAULT).with_detail(format!("{err:#}")),
                );
            }
            Err(panic) => {
                ctx.register(
                    IncidentReport::code(codes::HANDLER_FAULT)
                        .with_detail(format!("Handler panicked: {}", panic_message(&*panic))),
                );
            }
        }
    }
}

fn abort(ctx: &mut RunContext, at: StageNumber, not_attempted: &[StageNumber]) {
    let remaining: Vec<String> = not_attempted.iter().map(ToString::to_string).collect();
    ctx.register(
        IncidentReport::code(codes::RUN_ABORTED)
            .with_detail(format!(
                "Fatal incident in stage {at}; not attempted: [{}]",
                remaining.join(", ")
            ))
            .with_context_entry("stage", at.get()),
    );
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
