//! Test assertions for runs and contexts.

use crate::context::RunContext;
use crate::core::StageKey;
use crate::pipeline::RunReport;

/// Asserts that exactly `expected` stages had their handlers attempted.
pub fn assert_attempted(report: &RunReport, expected: &[u32]) {
    let attempted: Vec<u32> = report.attempted().iter().map(|n| n.get()).collect();
    assert_eq!(attempted, expected, "Unexpected attempted stages");
}

/// Asserts that stage `number` ran and succeeded.
pub fn assert_stage_succeeded(report: &RunReport, number: u32) {
    let result = report
        .stage(number)
        .unwrap_or_else(|| panic!("Stage {number} has no result"));
    assert!(
        !result.skipped && result.success,
        "Expected stage {number} to succeed, got {result:?}"
    );
}

/// Asserts that stage `number` ran and failed.
pub fn assert_stage_failed(report: &RunReport, number: u32) {
    let result = report
        .stage(number)
        .unwrap_or_else(|| panic!("Stage {number} has no result"));
    assert!(
        result.is_failed(),
        "Expected stage {number} to fail, got {result:?}"
    );
}

/// Asserts that stage `number` was recorded as skipped.
pub fn assert_stage_skipped(report: &RunReport, number: u32) {
    let result = report
        .stage(number)
        .unwrap_or_else(|| panic!("Stage {number} has no result"));
    assert!(
        result.skipped && !result.success,
        "Expected stage {number} to be skipped, got {result:?}"
    );
}

/// Asserts that an incident with `code` is attributed to `key`.
pub fn assert_has_incident(ctx: &RunContext, key: StageKey, code: &str) {
    let found = ctx
        .incidents(key)
        .is_some_and(|ledger| ledger.iter().any(|i| i.code == code));
    assert!(found, "Expected incident '{code}' attributed to {key}");
}

/// Asserts that no incident with `code` was tracked anywhere in the run.
pub fn assert_no_incident(ctx: &RunContext, code: &str) {
    let found: Vec<_> = ctx.all_incidents().filter(|i| i.code == code).collect();
    assert!(found.is_empty(), "Unexpected incident '{code}': {found:?}");
}
