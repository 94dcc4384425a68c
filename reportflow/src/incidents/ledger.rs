//! Severity-bucketed incident storage for one stage.

use super::Incident;
use crate::core::Severity;
use std::collections::BTreeMap;

/// Incidents of one stage, bucketed by severity.
#[derive(Debug, Clone, Default)]
pub struct IncidentLedger {
    buckets: BTreeMap<Severity, Vec<Incident>>,
}

impl IncidentLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, incident: Incident) {
        self.buckets
            .entry(incident.severity)
            .or_default()
            .push(incident);
    }

    /// Returns the incidents of one severity, oldest first.
    #[must_use]
    pub fn get(&self, severity: Severity) -> &[Incident] {
        self.buckets.get(&severity).map_or(&[], Vec::as_slice)
    }

    /// Iterates all incidents, lowest severity first.
    pub fn iter(&self) -> impl Iterator<Item = &Incident> {
        self.buckets.values().flatten()
    }

    /// Returns the number of incidents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    /// Returns true if the ledger holds nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the highest severity present.
    #[must_use]
    pub fn worst(&self) -> Option<Severity> {
        self.buckets
            .iter()
            .rev()
            .find(|(_, v)| !v.is_empty())
            .map(|(s, _)| *s)
    }
}
