//! Test fixtures for pipeline testing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::PipelineConfig;
use crate::context::RunContext;
use crate::core::Severity;
use crate::events::IncidentSink;
use crate::incidents::IncidentCatalog;
use crate::manifest::ManifestTemplate;
use crate::stages::StageDefinition;

/// A configuration builder for tests.
#[derive(Debug, Clone)]
pub struct TestPipeline {
    config: PipelineConfig,
}

impl TestPipeline {
    /// Creates a pipeline with no stages writing manifests to `manifest_dir`.
    #[must_use]
    pub fn new(manifest_dir: impl AsRef<Path>) -> Self {
        Self {
            config: PipelineConfig::new("test-pipeline")
                .with_manifest_dir(manifest_dir.as_ref().to_path_buf()),
        }
    }

    /// Creates the five-stage compliance pipeline:
    ///
    /// | #  | name      | reads                | writes    |
    /// |----|-----------|----------------------|-----------|
    /// | 10 | Discover  |                      | Discover  |
    /// | 20 | Validate  | Discover             | Validate  |
    /// | 30 | Transform | Validate             | Transform |
    /// | 40 | Transfer  | Transform (optional) | Transfer  |
    /// | 50 | Report    | Transfer             |           |
    #[must_use]
    pub fn standard(manifest_dir: impl AsRef<Path>) -> Self {
        Self::new(manifest_dir)
            .with_stage(StageDefinition::new(10, "Discover").with_manifest().with_next_stage(20))
            .with_stage(
                StageDefinition::new(20, "Validate")
                    .with_input("Discover")
                    .with_manifest()
                    .with_next_stage(30),
            )
            .with_stage(
                StageDefinition::new(30, "Transform")
                    .with_input("Validate")
                    .with_manifest()
                    .with_next_stage(40),
            )
            .with_stage(
                StageDefinition::new(40, "Transfer")
                    .with_input("Transform")
                    .with_optional_input()
                    .with_manifest()
                    .with_next_stage(50),
            )
            .with_stage(StageDefinition::new(50, "Report").with_input("Transfer"))
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: StageDefinition) -> Self {
        self.config = self.config.with_stage(stage);
        self
    }

    /// Sets the tracking threshold.
    #[must_use]
    pub fn with_incident_level(mut self, level: Severity) -> Self {
        self.config = self.config.with_incident_level(level);
        self
    }

    /// Sets the logging threshold.
    #[must_use]
    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.config = self.config.with_log_level(level);
        self
    }

    /// Sets the manifest nesting limit.
    #[must_use]
    pub fn with_max_json_depth(mut self, depth: usize) -> Self {
        self.config = self.config.with_max_json_depth(depth);
        self
    }

    /// Sets the discovery age limit.
    #[must_use]
    pub fn with_max_manifest_age_hours(mut self, hours: u64) -> Self {
        self.config = self.config.with_max_manifest_age_hours(hours);
        self
    }

    /// Adds a manifest template.
    #[must_use]
    pub fn with_manifest_template(
        mut self,
        manifest_type: impl Into<String>,
        template: ManifestTemplate,
    ) -> Self {
        self.config = self.config.with_manifest_template(manifest_type, template);
        self
    }

    /// Sets the incident log directory.
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config = self.config.with_log_dir(dir);
        self
    }

    /// Returns the configuration.
    #[must_use]
    pub fn build(self) -> PipelineConfig {
        self.config
    }

    /// Builds a run context over the built-in catalog.
    #[must_use]
    pub fn context(self) -> RunContext {
        RunContext::new(Arc::new(self.config), Arc::new(IncidentCatalog::builtin()))
    }

    /// Builds a run context that reports to `sink`.
    #[must_use]
    pub fn context_with_sink(self, sink: Arc<dyn IncidentSink>) -> RunContext {
        self.context().with_sink(sink)
    }
}
