//! Run requests and the realized run plan.

use crate::core::StageNumber;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

/// What the caller asked for.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    /// First stage to run; defaults to the lowest configured stage.
    #[serde(default)]
    pub start: Option<StageNumber>,
    /// Last stage to run; defaults to the highest configured stage.
    #[serde(default)]
    pub stop: Option<StageNumber>,
    /// Stages to record as skipped.
    #[serde(default)]
    pub skip: BTreeSet<StageNumber>,
    /// Explicit input manifest paths, by stage.
    #[serde(default)]
    pub input_paths: HashMap<StageNumber, PathBuf>,
}

impl RunRequest {
    /// Requests a run of every configured stage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the first stage.
    #[must_use]
    pub fn with_start(mut self, start: u32) -> Self {
        self.start = Some(StageNumber(start));
        self
    }

    /// Sets the last stage.
    #[must_use]
    pub fn with_stop(mut self, stop: u32) -> Self {
        self.stop = Some(StageNumber(stop));
        self
    }

    /// Adds a stage to skip.
    #[must_use]
    pub fn with_skip(mut self, stage: u32) -> Self {
        self.skip.insert(StageNumber(stage));
        self
    }

    /// Sets an explicit input manifest path for a stage.
    #[must_use]
    pub fn with_input(mut self, stage: u32, path: impl Into<PathBuf>) -> Self {
        self.input_paths.insert(StageNumber(stage), path.into());
        self
    }
}

/// The stages a run walks, realized from the domain and a request.
///
/// The bounded list is every domain stage within `[start, stop]`,
/// ascending. Skipped stages stay in the bounded list so the lifecycle can
/// record them; the run list leaves them out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunPlan {
    bounded: Vec<StageNumber>,
    skip: BTreeSet<StageNumber>,
}

impl RunPlan {
    /// Realizes a plan over `domain`.
    ///
    /// Missing bounds default to the ends of the domain. Skip entries
    /// outside the bounded list are ignored.
    #[must_use]
    pub fn realize(
        domain: &[StageNumber],
        start: Option<StageNumber>,
        stop: Option<StageNumber>,
        skip: &BTreeSet<StageNumber>,
    ) -> Self {
        let lower = start.unwrap_or(StageNumber(u32::MIN));
        let upper = stop.unwrap_or(StageNumber(u32::MAX));

        let bounded: Vec<StageNumber> = domain
            .iter()
            .copied()
            .filter(|n| *n >= lower && *n <= upper)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let skip = skip
            .iter()
            .copied()
            .filter(|n| bounded.contains(n))
            .collect();

        Self { bounded, skip }
    }

    /// Realizes a plan from a request.
    #[must_use]
    pub fn from_request(domain: &[StageNumber], request: &RunRequest) -> Self {
        Self::realize(domain, request.start, request.stop, &request.skip)
    }

    /// Returns every stage the lifecycle will see, ascending.
    #[must_use]
    pub fn bounded(&self) -> &[StageNumber] {
        &self.bounded
    }

    /// Returns the stages whose handlers will be attempted, ascending.
    #[must_use]
    pub fn run_list(&self) -> Vec<StageNumber> {
        self.bounded
            .iter()
            .copied()
            .filter(|n| !self.skip.contains(n))
            .collect()
    }

    /// Returns the skipped stages within the bound.
    #[must_use]
    pub fn skipped(&self) -> &BTreeSet<StageNumber> {
        &self.skip
    }

    /// Returns true if `number` is skipped.
    #[must_use]
    pub fn is_skipped(&self, number: StageNumber) -> bool {
        self.skip.contains(&number)
    }

    /// Returns true if `number` is within the bound.
    #[must_use]
    pub fn contains(&self, number: StageNumber) -> bool {
        self.bounded.contains(&number)
    }

    /// Returns the first stage of the bound.
    #[must_use]
    pub fn first(&self) -> Option<StageNumber> {
        self.bounded.first().copied()
    }

    /// Returns true if the bound is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bounded.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn domain() -> Vec<StageNumber> {
        [10, 20, 30, 40, 50, 60].into_iter().map(StageNumber).collect()
    }

    fn numbers(list: &[StageNumber]) -> Vec<u32> {
        list.iter().map(|n| n.get()).collect()
    }

    #[test]
    fn test_bounds_and_skip() {
        let request = RunRequest::new().with_start(10).with_stop(50).with_skip(30);
        let plan = RunPlan::from_request(&domain(), &request);

        assert_eq!(numbers(plan.bounded()), vec![10, 20, 30, 40, 50]);
        assert_eq!(numbers(&plan.run_list()), vec![10, 20, 40, 50]);
        assert!(plan.is_skipped(StageNumber(30)));
        assert_eq!(plan.first(), Some(StageNumber(10)));
    }

    #[test]
    fn test_defaults_cover_domain() {
        let plan = RunPlan::realize(&domain(), None, None, &BTreeSet::new());
        assert_eq!(numbers(&plan.run_list()), vec![10, 20, 30, 40, 50, 60]);
    }

    #[test]
    fn test_bounds_need_not_be_domain_members() {
        let plan = RunPlan::realize(
            &domain(),
            Some(StageNumber(15)),
            Some(StageNumber(45)),
            &BTreeSet::new(),
        );
        assert_eq!(numbers(plan.bounded()), vec![20, 30, 40]);
    }

    #[test]
    fn test_skip_outside_bound_is_ignored() {
        let request = RunRequest::new().with_start(30).with_skip(10).with_skip(40);
        let plan = RunPlan::from_request(&domain(), &request);

        assert_eq!(plan.skipped().len(), 1);
        assert!(!plan.is_skipped(StageNumber(10)));
        assert!(!plan.contains(StageNumber(10)));
        assert_eq!(numbers(&plan.run_list()), vec![30, 50, 60]);
    }

    #[test]
    fn test_unsorted_domain_and_empty_bound() {
        let unsorted: Vec<StageNumber> = [30, 10, 20, 10].into_iter().map(StageNumber).collect();
        let plan = RunPlan::realize(&unsorted, None, None, &BTreeSet::new());
        assert_eq!(numbers(plan.bounded()), vec![10, 20, 30]);

        let empty = RunPlan::realize(&unsorted, Some(StageNumber(40)), None, &BTreeSet::new());
        assert!(empty.is_empty());
        assert_eq!(empty.first(), None);
    }
}
