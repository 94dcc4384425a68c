//! Core domain model types for reportflow.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Incident severities and per-severity counters
//! - Stage numbers and incident attribution keys
//! - Stage lifecycle states
//! - The stage handler outcome

mod key;
mod outcome;
mod severity;
mod status;

pub use key::{ParseStageKeyError, StageKey, StageNumber};
pub use outcome::StageOutcome;
pub use severity::{ParseSeverityError, Severity, SeverityCounts};
pub use status::StageState;
