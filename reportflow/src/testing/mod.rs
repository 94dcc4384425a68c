//! Testing utilities for reportflow pipelines.
//!
//! This module provides:
//! - A configuration builder with a standard five-stage pipeline
//! - Mock stage handlers
//! - Assertions over run reports and contexts

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{
    assert_attempted, assert_has_incident, assert_no_incident, assert_stage_failed,
    assert_stage_skipped, assert_stage_succeeded,
};
pub use fixtures::TestPipeline;
pub use mocks::{
    call_log, CallLog, ErrorReportingStage, FailingStage, PanickingStage, RecordingStage,
};
