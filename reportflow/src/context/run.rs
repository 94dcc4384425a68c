//! The per-run context.

use super::RunIdentity;
use crate::config::PipelineConfig;
use crate::core::{SeverityCounts, StageKey, StageNumber, StageOutcome, StageState};
use crate::events::{IncidentSink, TracingIncidentSink};
use crate::incidents::{ErrorRecord, Incident, IncidentCatalog, IncidentLedger, IncidentReport, IncidentRouter};
use crate::manifest::{Manifest, ManifestStore};
use crate::observability::SpanTimer;
use crate::pipeline::RunPlan;
use crate::stages::{StageDefinition, StageResult};
use crate::utils::Timestamp;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use uuid::Uuid;

/// The stage whose execution window is open.
#[derive(Debug)]
pub(crate) struct ActiveStage {
    pub(crate) definition: StageDefinition,
    pub(crate) state: StageState,
    pub(crate) started_at: Timestamp,
    pub(crate) timer: SpanTimer,
    pub(crate) outcome: Option<StageOutcome>,
}

/// Everything one run knows.
///
/// Owned by the driver and lent to the lifecycle, the manifest store and
/// handlers as `&mut`. Never persisted.
pub struct RunContext {
    identity: RunIdentity,
    config: Arc<PipelineConfig>,
    router: Arc<IncidentRouter>,
    store: Arc<ManifestStore>,
    pub(crate) sink: Arc<dyn IncidentSink>,
    pub(crate) plan: Option<RunPlan>,
    pub(crate) current: Option<ActiveStage>,
    pub(crate) attribution: StageKey,
    pub(crate) next_expected: Option<StageNumber>,
    pub(crate) manifests: HashMap<String, Manifest>,
    pub(crate) manifest_in: Option<Manifest>,
    pub(crate) manifest_out: Option<Manifest>,
    pub(crate) incidents: BTreeMap<StageKey, IncidentLedger>,
    pub(crate) metrics: BTreeMap<StageKey, SeverityCounts>,
    pub(crate) errors: Vec<ErrorRecord>,
    pub(crate) has_errors: bool,
    pub(crate) has_fatal_errors: bool,
    pub(crate) summary: Vec<String>,
    pub(crate) results: BTreeMap<StageNumber, StageResult>,
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("execution_id", &self.identity.execution_id)
            .field("pipeline", &self.config.name)
            .field("attribution", &self.attribution)
            .field("next_expected", &self.next_expected)
            .field("has_errors", &self.has_errors)
            .field("has_fatal_errors", &self.has_fatal_errors)
            .finish_non_exhaustive()
    }
}

impl RunContext {
    /// Creates a context for a new run.
    ///
    /// The router takes its thresholds and the store its directory and
    /// limits from `config`. Incidents go to a [`TracingIncidentSink`] until
    /// [`Self::with_sink`] says otherwise.
    #[must_use]
    pub fn new(config: Arc<PipelineConfig>, catalog: Arc<IncidentCatalog>) -> Self {
        let router = IncidentRouter::new(catalog, config.incident_level, config.log_level);
        let store = ManifestStore::from_config(&config);
        Self {
            identity: RunIdentity::new(),
            router: Arc::new(router),
            store: Arc::new(store),
            config,
            sink: Arc::new(TracingIncidentSink),
            plan: None,
            current: None,
            attribution: StageKey::Orchestrator,
            next_expected: None,
            manifests: HashMap::new(),
            manifest_in: None,
            manifest_out: None,
            incidents: BTreeMap::new(),
            metrics: BTreeMap::new(),
            errors: Vec::new(),
            has_errors: false,
            has_fatal_errors: false,
            summary: Vec::new(),
            results: BTreeMap::new(),
        }
    }

    /// Replaces the incident sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn IncidentSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replaces the run identity.
    #[must_use]
    pub fn with_identity(mut self, identity: RunIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Replaces the manifest store.
    #[must_use]
    pub fn with_store(mut self, store: ManifestStore) -> Self {
        self.store = Arc::new(store);
        self
    }

    /// Registers an incident against the current attribution.
    pub fn register(&mut self, report: IncidentReport) -> Option<Incident> {
        let router = Arc::clone(&self.router);
        router.register(self, report)
    }

    /// Returns the run identity.
    #[must_use]
    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the execution id.
    #[must_use]
    pub fn execution_id(&self) -> Uuid {
        self.identity.execution_id
    }

    /// Returns the run start time.
    #[must_use]
    pub fn started_at(&self) -> Timestamp {
        self.identity.started_at
    }

    /// Returns the shared configuration.
    #[must_use]
    pub fn config(&self) -> &Arc<PipelineConfig> {
        &self.config
    }

    /// Returns the incident router.
    #[must_use]
    pub fn router(&self) -> &IncidentRouter {
        &self.router
    }

    /// Returns a handle to the manifest store.
    ///
    /// The handle is owned so it can be used together with `&mut self`:
    /// `ctx.store().find(ctx, "Discover", None)`.
    #[must_use]
    pub fn store(&self) -> Arc<ManifestStore> {
        Arc::clone(&self.store)
    }

    /// Returns the incident sink.
    #[must_use]
    pub fn sink(&self) -> &Arc<dyn IncidentSink> {
        &self.sink
    }

    /// Returns the realized run plan, once the driver has set it.
    #[must_use]
    pub fn plan(&self) -> Option<&RunPlan> {
        self.plan.as_ref()
    }

    /// Returns true if the plan skips `number`.
    #[must_use]
    pub fn is_skipped(&self, number: StageNumber) -> bool {
        self.plan.as_ref().is_some_and(|p| p.is_skipped(number))
    }

    /// Returns the active stage's definition.
    #[must_use]
    pub fn current_stage(&self) -> Option<&StageDefinition> {
        self.current.as_ref().map(|a| &a.definition)
    }

    /// Returns the active stage's state.
    #[must_use]
    pub fn current_state(&self) -> Option<StageState> {
        self.current.as_ref().map(|a| a.state)
    }

    /// Returns who incidents are currently attributed to.
    #[must_use]
    pub fn attribution(&self) -> StageKey {
        self.attribution
    }

    /// Returns the display name of the current attribution.
    #[must_use]
    pub fn attribution_name(&self) -> String {
        match self.attribution {
            StageKey::Orchestrator => "orchestrator".to_string(),
            StageKey::Stage(number) => self
                .current_stage()
                .filter(|d| d.number == number)
                .or_else(|| self.config.stage(number))
                .map_or_else(|| format!("stage-{number}"), |d| d.name.clone()),
        }
    }

    /// Name used for manifests saved without a type.
    #[must_use]
    pub fn producing_stage_name(&self) -> String {
        self.current_stage()
            .map_or_else(|| "orchestrator".to_string(), |d| d.name.clone())
    }

    /// Returns the stage number the lifecycle expects next.
    #[must_use]
    pub fn next_expected(&self) -> Option<StageNumber> {
        self.next_expected
    }

    /// Returns the cached manifest of `manifest_type`.
    #[must_use]
    pub fn cached_manifest(&self, manifest_type: &str) -> Option<&Manifest> {
        self.manifests.get(manifest_type)
    }

    /// Returns the active stage's input manifest.
    #[must_use]
    pub fn manifest_in(&self) -> Option<&Manifest> {
        self.manifest_in.as_ref()
    }

    /// Returns the active stage's output manifest.
    #[must_use]
    pub fn manifest_out(&self) -> Option<&Manifest> {
        self.manifest_out.as_ref()
    }

    /// Returns the active stage's output manifest for editing.
    pub fn manifest_out_mut(&mut self) -> Option<&mut Manifest> {
        self.manifest_out.as_mut()
    }

    /// Returns the incidents attributed to `key`.
    #[must_use]
    pub fn incidents(&self, key: StageKey) -> Option<&IncidentLedger> {
        self.incidents.get(&key)
    }

    /// Iterates every tracked incident, by attribution then severity.
    pub fn all_incidents(&self) -> impl Iterator<Item = &Incident> {
        self.incidents.values().flat_map(|ledger| ledger.iter())
    }

    /// Returns the severity counters of `key`.
    #[must_use]
    pub fn metrics(&self, key: StageKey) -> Option<&SeverityCounts> {
        self.metrics.get(&key)
    }

    /// Returns run-wide severity totals.
    #[must_use]
    pub fn totals(&self) -> SeverityCounts {
        self.metrics.values().fold(SeverityCounts::new(), |mut acc, c| {
            acc.merge(c);
            acc
        })
    }

    /// Returns every Error and Fatal incident of the run, oldest first.
    #[must_use]
    pub fn errors(&self) -> &[ErrorRecord] {
        &self.errors
    }

    /// Returns true if the active stage has registered an Error or Fatal.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Returns true once any Fatal incident has been registered.
    #[must_use]
    pub fn has_fatal_errors(&self) -> bool {
        self.has_fatal_errors
    }

    /// Appends a line to the active stage's summary.
    pub fn add_summary(&mut self, line: impl Into<String>) {
        self.summary.push(line.into());
    }

    /// Returns the active stage's summary lines.
    #[must_use]
    pub fn summary(&self) -> &[String] {
        &self.summary
    }

    /// Returns the results of stopped stages, by number.
    #[must_use]
    pub fn results(&self) -> &BTreeMap<StageNumber, StageResult> {
        &self.results
    }

    /// Returns the result of one stopped stage.
    #[must_use]
    pub fn result(&self, number: StageNumber) -> Option<&StageResult> {
        self.results.get(&number)
    }
}
