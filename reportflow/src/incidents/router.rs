//! Incident classification, filtering, counting and escalation.

use super::{codes, ErrorRecord, Incident, IncidentCatalog, IncidentDefinition, IncidentReport};
use crate::context::RunContext;
use crate::core::Severity;
use std::sync::Arc;

/// Routes incident reports into the run context.
///
/// Two thresholds apply independently: `incident_level` decides what is
/// tracked and escalated, `log_level` decides what reaches the run's
/// incident sink.
#[derive(Debug, Clone)]
pub struct IncidentRouter {
    catalog: Arc<IncidentCatalog>,
    incident_level: Severity,
    log_level: Severity,
}

impl IncidentRouter {
    /// Creates a router over `catalog`.
    #[must_use]
    pub fn new(catalog: Arc<IncidentCatalog>, incident_level: Severity, log_level: Severity) -> Self {
        Self {
            catalog,
            incident_level,
            log_level,
        }
    }

    /// Returns the tracking threshold.
    #[must_use]
    pub fn incident_level(&self) -> Severity {
        self.incident_level
    }

    /// Returns the logging threshold.
    #[must_use]
    pub fn log_level(&self) -> Severity {
        self.log_level
    }

    /// Returns the catalog.
    #[must_use]
    pub fn catalog(&self) -> &IncidentCatalog {
        &self.catalog
    }

    /// Registers `report` against the stage currently attributed in `ctx`.
    ///
    /// Returns `None` when the effective severity is below the tracking
    /// threshold; such reports leave no trace. Never fails: an unknown code
    /// falls back to the generic definition.
    pub fn register(&self, ctx: &mut RunContext, report: IncidentReport) -> Option<Incident> {
        let (code, definition) = match report.code.as_deref() {
            None => (codes::ADHOC.to_string(), None),
            Some(code) => match self.catalog.resolve(code) {
                Some(definition) => (code.to_string(), Some(definition.clone())),
                None => {
                    self.log_catalog_miss(ctx, code);
                    (code.to_string(), Some(IncidentDefinition::unknown()))
                }
            },
        };

        let severity = definition
            .as_ref()
            .map_or_else(|| report.level.unwrap_or(Severity::Info), |d| d.severity);

        if severity < self.incident_level {
            return None;
        }

        let message = report
            .message
            .or_else(|| definition.as_ref().map(|d| d.default_message.clone()))
            .unwrap_or_default();
        let recommendation = report
            .recommendation
            .or_else(|| definition.and_then(|d| d.default_recommendation));

        let stage = ctx.attribution;
        let incident = Incident {
            timestamp: crate::utils::now_utc(),
            execution_id: ctx.execution_id(),
            stage,
            stage_name: ctx.attribution_name(),
            severity,
            code,
            message,
            detail: report.detail,
            recommendation,
            context: report.context,
        };

        ctx.incidents
            .entry(stage)
            .or_default()
            .push(incident.clone());
        ctx.metrics.entry(stage).or_default().increment(severity);

        if severity.is_failure() {
            ctx.errors.push(ErrorRecord::from(&incident));
            ctx.has_errors = true;
        }
        if severity == Severity::Fatal {
            ctx.has_fatal_errors = true;
        }

        if severity >= self.log_level {
            ctx.sink.record(&incident);
        }

        Some(incident)
    }

    fn log_catalog_miss(&self, ctx: &RunContext, code: &str) {
        tracing::debug!(code, "Incident code not found in catalog");
        if Severity::Warning >= self.log_level {
            ctx.sink.log(
                Severity::Warning,
                &format!(
                    "Incident code '{code}' is not in the catalog; using the generic '{}' definition",
                    codes::UNKNOWN_INCIDENT
                ),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{StageKey, StageNumber};
    use crate::events::CollectingIncidentSink;
    use crate::testing::TestPipeline;

    fn context_with(
        incident_level: Severity,
        log_level: Severity,
    ) -> (RunContext, Arc<CollectingIncidentSink>, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let sink = Arc::new(CollectingIncidentSink::new());
        let config = TestPipeline::standard(dir.path())
            .with_incident_level(incident_level)
            .with_log_level(log_level)
            .build();
        let ctx = RunContext::new(Arc::new(config), Arc::new(IncidentCatalog::builtin()))
            .with_sink(sink.clone());
        (ctx, sink, dir)
    }

    #[test]
    fn test_register_known_code_uses_definition() {
        let (mut ctx, sink, _dir) = context_with(Severity::Debug, Severity::Debug);

        let incident = ctx
            .register(IncidentReport::code(codes::MANIFEST_SAVE_FAILED).with_detail("disk full"))
            .unwrap();

        assert_eq!(incident.severity, Severity::Error);
        assert_eq!(incident.message, "Manifest could not be saved");
        assert!(incident.recommendation.is_some());
        assert_eq!(incident.stage, StageKey::Orchestrator);
        assert_eq!(sink.incidents().len(), 1);
        assert!(ctx.has_errors());
        assert!(!ctx.has_fatal_errors());
        assert_eq!(ctx.errors().len(), 1);
    }

    #[test]
    fn test_explicit_level_does_not_override_definition() {
        let (mut ctx, _sink, _dir) = context_with(Severity::Debug, Severity::Debug);

        let incident = ctx
            .register(IncidentReport::code(codes::HANDLER_FAULT).with_level(Severity::Info))
            .unwrap();

        assert_eq!(incident.severity, Severity::Fatal);
        assert!(ctx.has_fatal_errors());
    }

    #[test]
    fn test_below_incident_level_is_dropped_everywhere() {
        let (mut ctx, sink, _dir) = context_with(Severity::Error, Severity::Debug);

        let dropped = ctx.register(IncidentReport::code(codes::MANIFEST_PARSE_FAILED));
        let dropped_adhoc = ctx.register(IncidentReport::adhoc(Severity::Warning, "slow"));

        assert!(dropped.is_none());
        assert!(dropped_adhoc.is_none());
        assert!(ctx.incidents(StageKey::Orchestrator).is_none());
        assert!(ctx.metrics(StageKey::Orchestrator).is_none());
        assert!(ctx.errors().is_empty());
        assert!(sink.incidents().is_empty());
        assert!(!ctx.has_errors());
    }

    #[test]
    fn test_tracked_but_not_logged() {
        let (mut ctx, sink, _dir) = context_with(Severity::Info, Severity::Error);

        let incident = ctx.register(IncidentReport::code(codes::MANIFEST_TYPE_MISMATCH));

        assert!(incident.is_some());
        assert_eq!(
            ctx.metrics(StageKey::Orchestrator).unwrap().get(Severity::Warning),
            1
        );
        assert!(sink.incidents().is_empty());
    }

    #[test]
    fn test_unknown_code_falls_back_and_warns() {
        let (mut ctx, sink, _dir) = context_with(Severity::Info, Severity::Info);

        let incident = ctx
            .register(IncidentReport::code("NOT-A-CODE").with_detail("from handler"))
            .unwrap();

        assert_eq!(incident.code, "NOT-A-CODE");
        assert_eq!(incident.severity, Severity::Warning);
        assert_eq!(incident.message, "Unknown incident");

        let logs = sink.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].0, Severity::Warning);
        assert!(logs[0].1.contains("NOT-A-CODE"));
    }

    #[test]
    fn test_adhoc_defaults_to_info() {
        let (mut ctx, _sink, _dir) = context_with(Severity::Debug, Severity::Debug);

        let incident = ctx
            .register(IncidentReport {
                message: Some("note".to_string()),
                ..IncidentReport::default()
            })
            .unwrap();

        assert_eq!(incident.code, codes::ADHOC);
        assert_eq!(incident.severity, Severity::Info);
    }

    #[test]
    fn test_incidents_bucketed_by_attribution() {
        let (mut ctx, _sink, _dir) = context_with(Severity::Debug, Severity::Fatal);
        ctx.attribution = StageKey::Stage(StageNumber(20));

        ctx.register(IncidentReport::adhoc(Severity::Warning, "a"));
        ctx.register(IncidentReport::adhoc(Severity::Warning, "b"));
        ctx.register(IncidentReport::adhoc(Severity::Error, "c"));

        let ledger = ctx.incidents(StageKey::Stage(StageNumber(20))).unwrap();
        assert_eq!(ledger.get(Severity::Warning).len(), 2);
        assert_eq!(ledger.get(Severity::Error).len(), 1);
        assert_eq!(ledger.worst(), Some(Severity::Error));
        assert_eq!(ctx.errors()[0].stage, StageKey::Stage(StageNumber(20)));
    }
}
