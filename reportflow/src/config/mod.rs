//! Pipeline configuration.
//!
//! Loaded once per run from a JSON file and shared read-only through
//! `Arc<PipelineConfig>`.

use crate::core::{Severity, StageNumber};
use crate::errors::{CatalogError, ConfigError, ReportflowError};
use crate::incidents::IncidentCatalog;
use crate::manifest::ManifestTemplate;
use crate::stages::StageDefinition;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

/// Stage names and manifest types end up in `<Type>_<timestamp>` file names,
/// so they may not contain `_`.
static IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9.-]*$").expect("identifier pattern is valid")
});

const fn default_max_age_hours() -> u64 {
    24
}

const fn default_max_json_depth() -> usize {
    32
}

fn default_manifest_dir() -> PathBuf {
    PathBuf::from("manifests")
}

/// Static configuration of one pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Pipeline name, used in logs.
    pub name: String,
    /// The fixed stage list, ascending by number.
    pub stages: Vec<StageDefinition>,
    /// Directory manifests are written to and discovered in.
    #[serde(default = "default_manifest_dir")]
    pub manifest_dir: PathBuf,
    /// Discovery ignores manifests older than this.
    #[serde(default = "default_max_age_hours")]
    pub max_manifest_age_hours: u64,
    /// Manifests nesting deeper than this are not saved.
    #[serde(default = "default_max_json_depth")]
    pub max_json_depth: usize,
    /// Minimum severity forwarded to the incident sink.
    #[serde(default)]
    pub log_level: Severity,
    /// Minimum severity tracked at all.
    #[serde(default)]
    pub incident_level: Severity,
    /// Optional catalog file layered over the built-in codes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub incident_catalog: Option<PathBuf>,
    /// Directory for per-run JSON-lines incident logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_dir: Option<PathBuf>,
    /// Skeleton data and metrics per manifest type.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub manifest_templates: HashMap<String, ManifestTemplate>,
}

impl PipelineConfig {
    /// Creates a configuration with no stages and default limits.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            manifest_dir: default_manifest_dir(),
            max_manifest_age_hours: default_max_age_hours(),
            max_json_depth: default_max_json_depth(),
            log_level: Severity::default(),
            incident_level: Severity::default(),
            incident_catalog: None,
            log_dir: None,
            manifest_templates: HashMap::new(),
        }
    }

    /// Parses a configuration from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a configuration.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Loads a configuration file.
    ///
    /// Relative paths inside the file are resolved against the file's
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        if let Some(base) = path.parent() {
            config.manifest_dir = base.join(&config.manifest_dir);
            config.incident_catalog = config.incident_catalog.map(|p| base.join(p));
            config.log_dir = config.log_dir.map(|p| base.join(p));
        }
        Ok(config)
    }

    /// Appends a stage.
    #[must_use]
    pub fn with_stage(mut self, stage: StageDefinition) -> Self {
        self.stages.push(stage);
        self
    }

    /// Sets the manifest directory.
    #[must_use]
    pub fn with_manifest_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.manifest_dir = dir.into();
        self
    }

    /// Sets the maximum manifest age for discovery.
    #[must_use]
    pub fn with_max_manifest_age_hours(mut self, hours: u64) -> Self {
        self.max_manifest_age_hours = hours;
        self
    }

    /// Sets the maximum nesting depth of saved manifests.
    #[must_use]
    pub fn with_max_json_depth(mut self, depth: usize) -> Self {
        self.max_json_depth = depth;
        self
    }

    /// Sets the logging threshold.
    #[must_use]
    pub fn with_log_level(mut self, level: Severity) -> Self {
        self.log_level = level;
        self
    }

    /// Sets the tracking threshold.
    #[must_use]
    pub fn with_incident_level(mut self, level: Severity) -> Self {
        self.incident_level = level;
        self
    }

    /// Sets the incident catalog file.
    #[must_use]
    pub fn with_incident_catalog(mut self, path: impl Into<PathBuf>) -> Self {
        self.incident_catalog = Some(path.into());
        self
    }

    /// Sets the incident log directory.
    #[must_use]
    pub fn with_log_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(dir.into());
        self
    }

    /// Adds a manifest template.
    #[must_use]
    pub fn with_manifest_template(
        mut self,
        manifest_type: impl Into<String>,
        template: ManifestTemplate,
    ) -> Self {
        self.manifest_templates.insert(manifest_type.into(), template);
        self
    }

    /// Returns the stage with `number`.
    #[must_use]
    pub fn stage(&self, number: StageNumber) -> Option<&StageDefinition> {
        self.stages.iter().find(|s| s.number == number)
    }

    /// Returns the numeric stage domain, in declaration order.
    #[must_use]
    pub fn stage_numbers(&self) -> Vec<StageNumber> {
        self.stages.iter().map(|s| s.number).collect()
    }

    /// Returns the discovery age limit.
    #[must_use]
    pub fn max_manifest_age(&self) -> Duration {
        Duration::from_secs(self.max_manifest_age_hours.saturating_mul(3600))
    }

    /// Loads the configured catalog, or the built-in one.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured catalog cannot be loaded.
    pub fn load_catalog(&self) -> Result<IncidentCatalog, CatalogError> {
        self.incident_catalog
            .as_ref()
            .map_or_else(|| Ok(IncidentCatalog::builtin()), IncidentCatalog::load)
    }

    /// Loads a configuration file, validates it and loads its catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is unreadable or invalid, or if its
    /// catalog cannot be loaded.
    pub fn load(path: impl AsRef<Path>) -> Result<LoadedPipeline, ReportflowError> {
        let config = Self::from_file(path)?;
        let warnings = config.validate()?;
        let catalog = config.load_catalog()?;
        Ok(LoadedPipeline {
            config,
            catalog,
            warnings,
        })
    }

    /// Validates the configuration.
    ///
    /// Returns non-fatal findings (inputs no stage produces) on success.
    ///
    /// # Errors
    ///
    /// Returns the first structural problem found.
    pub fn validate(&self) -> Result<Vec<String>, ConfigError> {
        if self.stages.is_empty() {
            return Err(ConfigError::NoStages(self.name.clone()));
        }
        if self.max_json_depth == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "max_json_depth",
                reason: "must be at least 1".to_string(),
            });
        }

        let mut names = HashSet::new();
        for pair in self.stages.windows(2) {
            if pair[1].number <= pair[0].number {
                return Err(ConfigError::StageOrder {
                    previous: pair[0].number.get(),
                    current: pair[1].number.get(),
                });
            }
        }
        for stage in &self.stages {
            check_identifier("stage name", &stage.name)?;
            if let Some(ref manifest_type) = stage.manifest_type {
                check_identifier("manifest type", manifest_type)?;
            }
            if let Some(ref input) = stage.input_from {
                check_identifier("input type", input)?;
            }
            if !names.insert(stage.name.as_str()) {
                return Err(ConfigError::DuplicateStageName(stage.name.clone()));
            }
        }

        let produced: HashSet<&str> = self
            .stages
            .iter()
            .filter(|s| s.has_manifest)
            .map(StageDefinition::output_type)
            .collect();
        let mut warnings = Vec::new();
        for stage in &self.stages {
            if let Some(ref input) = stage.input_from {
                if !produced.contains(input.as_str()) {
                    warnings.push(format!(
                        "Stage {} ({}) reads '{input}', which no configured stage produces",
                        stage.number, stage.name
                    ));
                }
            }
            if let Some(next) = stage.next_stage {
                if self.stage(next).is_none() {
                    warnings.push(format!(
                        "Stage {} ({}) declares next stage {next}, which is not configured",
                        stage.number, stage.name
                    ));
                }
            }
        }
        Ok(warnings)
    }
}

fn check_identifier(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if IDENTIFIER.is_match(value) {
        Ok(())
    } else {
        Err(ConfigError::InvalidIdentifier {
            field,
            value: value.to_string(),
        })
    }
}

/// A validated configuration together with its incident catalog.
#[derive(Debug, Clone)]
pub struct LoadedPipeline {
    /// The configuration.
    pub config: PipelineConfig,
    /// The catalog named by the configuration, or the built-in one.
    pub catalog: IncidentCatalog,
    /// Non-fatal findings from validation.
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_stages() -> PipelineConfig {
        PipelineConfig::new("compliance")
            .with_stage(StageDefinition::new(10, "Discover").with_manifest().with_next_stage(20))
            .with_stage(StageDefinition::new(20, "Validate").with_input("Discover"))
    }

    #[test]
    fn test_defaults_from_json() {
        let config = PipelineConfig::from_json_str(
            r#"{"name": "compliance", "stages": [{"number": 10, "name": "Discover"}]}"#,
        )
        .unwrap();

        assert_eq!(config.max_manifest_age_hours, 24);
        assert_eq!(config.max_json_depth, 32);
        assert_eq!(config.log_level, Severity::Info);
        assert_eq!(config.incident_level, Severity::Info);
        assert_eq!(config.manifest_dir, PathBuf::from("manifests"));
        assert_eq!(config.max_manifest_age(), Duration::from_secs(86_400));
    }

    #[test]
    fn test_from_file_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(
            &path,
            r#"{"name": "compliance", "manifest_dir": "out", "log_dir": "logs",
                "log_level": "warning",
                "stages": [{"number": 10, "name": "Discover"}]}"#,
        )
        .unwrap();

        let config = PipelineConfig::from_file(&path).unwrap();

        assert_eq!(config.manifest_dir, dir.path().join("out"));
        assert_eq!(config.log_dir, Some(dir.path().join("logs")));
        assert_eq!(config.log_level, Severity::Warning);
    }

    #[test]
    fn test_from_file_errors() {
        let err = PipelineConfig::from_file("/no/such/pipeline.json").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));

        let err = PipelineConfig::from_json_str(r#"{"name": "x"}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_load_validates_and_reads_catalog() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("codes.json"),
            r#"{"VAL-001": {"Severity": "Error", "DefaultMessage": "Bad header"}}"#,
        )
        .unwrap();
        let path = dir.path().join("pipeline.json");
        std::fs::write(
            &path,
            r#"{"name": "compliance", "incident_catalog": "codes.json",
                "stages": [{"number": 10, "name": "Validate", "input_from": "Discover"}]}"#,
        )
        .unwrap();

        let loaded = PipelineConfig::load(&path).unwrap();

        assert_eq!(loaded.config.name, "compliance");
        assert!(loaded.catalog.resolve("VAL-001").is_some());
        assert_eq!(loaded.warnings.len(), 1);

        std::fs::write(&path, r#"{"name": "empty", "stages": []}"#).unwrap();
        let err = PipelineConfig::load(&path).unwrap_err();
        assert!(matches!(err, ReportflowError::Config(ConfigError::NoStages(_))));

        std::fs::write(
            &path,
            r#"{"name": "x", "incident_catalog": "missing.json",
                "stages": [{"number": 10, "name": "Discover"}]}"#,
        )
        .unwrap();
        let err = PipelineConfig::load(&path).unwrap_err();
        assert!(matches!(err, ReportflowError::Catalog(CatalogError::Read { .. })));
    }

    #[test]
    fn test_validate_ok() {
        assert!(two_stages().validate().unwrap().is_empty());
    }

    #[test]
    fn test_validate_rejects_structure() {
        let err = PipelineConfig::new("empty").validate().unwrap_err();
        assert!(matches!(err, ConfigError::NoStages(_)));

        let err = two_stages()
            .with_stage(StageDefinition::new(15, "Late"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::StageOrder { previous: 20, current: 15 }));

        let err = two_stages()
            .with_stage(StageDefinition::new(30, "Discover"))
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateStageName(_)));

        let err = two_stages().with_max_json_depth(0).validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidLimit { .. }));
    }

    #[test]
    fn test_validate_rejects_underscore_identifiers() {
        let err = PipelineConfig::new("bad")
            .with_stage(StageDefinition::new(10, "Load_Files"))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidIdentifier { field: "stage name", .. }
        ));

        let err = PipelineConfig::new("bad")
            .with_stage(StageDefinition::new(10, "Load").with_manifest_type("raw_files"))
            .validate()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidIdentifier { field: "manifest type", .. }
        ));
    }

    #[test]
    fn test_validate_warns_on_unproduced_input() {
        let warnings = PipelineConfig::new("warn")
            .with_stage(StageDefinition::new(10, "Validate").with_input("Discover").with_next_stage(99))
            .validate()
            .unwrap();

        assert_eq!(warnings.len(), 2);
        assert!(warnings[0].contains("'Discover'"));
        assert!(warnings[1].contains("next stage 99"));
    }

    #[test]
    fn test_load_catalog_defaults_to_builtin() {
        let catalog = two_stages().load_catalog().unwrap();
        assert_eq!(catalog.len(), IncidentCatalog::builtin().len());
    }
}
