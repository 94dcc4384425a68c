//! Observability utilities.

mod rollup;
mod tracing;

pub use self::tracing::{init_tracing, stage_span, SpanTimer};
pub use rollup::{emit_run_rollup, emit_stage_rollup, rollup_line};
