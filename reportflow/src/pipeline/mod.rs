//! Run planning and the orchestrator driver.
//!
//! This module provides:
//! - [`RunRequest`] and [`RunPlan`]: which stages a run walks
//! - [`Orchestrator`]: the sequential, fail-fast driver
//! - [`RunReport`]: what happened

mod driver;
mod plan;
mod report;

pub use driver::Orchestrator;
pub use plan::{RunPlan, RunRequest};
pub use report::RunReport;
