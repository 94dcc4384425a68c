//! Static incident definitions.

use super::codes;
use crate::core::Severity;
use crate::errors::CatalogError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Severity, default message and default recommendation for one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct IncidentDefinition {
    /// The severity every incident with this code gets.
    #[serde(alias = "severity")]
    pub severity: Severity,
    /// Message used when the report carries none.
    #[serde(default, alias = "message", alias = "default_message")]
    pub default_message: String,
    /// Remediation hint used when the report carries none.
    #[serde(default, alias = "recommendation", alias = "default_recommendation")]
    pub default_recommendation: Option<String>,
}

impl IncidentDefinition {
    /// Creates a new definition.
    #[must_use]
    pub fn new(severity: Severity, default_message: impl Into<String>) -> Self {
        Self {
            severity,
            default_message: default_message.into(),
            default_recommendation: None,
        }
    }

    /// Sets the default recommendation.
    #[must_use]
    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.default_recommendation = Some(recommendation.into());
        self
    }

    /// The generic definition used when a code is not in the catalog.
    #[must_use]
    pub fn unknown() -> Self {
        Self::new(Severity::Warning, "Unknown incident").with_recommendation(
            "Add the code to the incident catalog so it gets a proper severity and message.",
        )
    }
}

/// Code to definition lookup table, loaded once per run.
#[derive(Debug, Clone, Default)]
pub struct IncidentCatalog {
    definitions: HashMap<String, IncidentDefinition>,
}

impl IncidentCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog holding the orchestrator's own codes.
    #[must_use]
    pub fn builtin() -> Self {
        use Severity::{Debug, Error, Fatal, Info, Warning};

        let entries = [
            (
                codes::STAGE_SEQUENCE_MISMATCH,
                IncidentDefinition::new(Warning, "Stage started out of the declared sequence")
                    .with_recommendation("Check the next-stage numbers in the stage configuration."),
            ),
            (
                codes::STAGE_SKIPPED,
                IncidentDefinition::new(Info, "Stage skipped on request"),
            ),
            (
                codes::STAGE_STARTED,
                IncidentDefinition::new(Debug, "Stage started"),
            ),
            (
                codes::STAGE_FAILED,
                IncidentDefinition::new(Error, "Stage reported an unsuccessful outcome")
                    .with_recommendation("Review the stage's error list and rerun the stage."),
            ),
            (
                codes::HANDLER_FAULT,
                IncidentDefinition::new(Fatal, "Stage handler failed unexpectedly")
                    .with_recommendation(
                        "Inspect the detail for the underlying fault; the run was stopped.",
                    ),
            ),
            (
                codes::HANDLER_MISSING,
                IncidentDefinition::new(Fatal, "No handler registered for stage")
                    .with_recommendation("Register a handler under the stage's configured name."),
            ),
            (
                codes::RUN_ABORTED,
                IncidentDefinition::new(Warning, "Run aborted after a fatal incident")
                    .with_recommendation(
                        "Resolve the fatal incident, then rerun starting at the aborted stage.",
                    ),
            ),
            (
                codes::INPUT_REQUIRED,
                IncidentDefinition::new(Fatal, "Required input manifest could not be loaded")
                    .with_recommendation(
                        "Rerun the producing stage or pass an explicit manifest path.",
                    ),
            ),
            (
                codes::INPUT_MISSING,
                IncidentDefinition::new(Warning, "Optional input manifest not available"),
            ),
            (
                codes::MANIFEST_LOADED,
                IncidentDefinition::new(Info, "Manifest loaded"),
            ),
            (
                codes::MANIFEST_READ_FAILED,
                IncidentDefinition::new(Warning, "Manifest file could not be read"),
            ),
            (
                codes::MANIFEST_PARSE_FAILED,
                IncidentDefinition::new(Warning, "Manifest file is corrupt")
                    .with_recommendation("Remove or repair the file; older manifests are tried."),
            ),
            (
                codes::MANIFEST_TYPE_MISMATCH,
                IncidentDefinition::new(Warning, "Manifest file has an unexpected type"),
            ),
            (
                codes::MANIFEST_STALE,
                IncidentDefinition::new(Debug, "Manifest candidates older than the age limit ignored"),
            ),
            (
                codes::MANIFEST_DIR_UNREADABLE,
                IncidentDefinition::new(Warning, "Manifest directory could not be listed"),
            ),
            (
                codes::MANIFEST_DEPTH_EXCEEDED,
                IncidentDefinition::new(Warning, "Manifest nests too deeply to be saved")
                    .with_recommendation("Flatten the stage's manifest data or raise max_json_depth."),
            ),
            (
                codes::MANIFEST_SAVE_FAILED,
                IncidentDefinition::new(Error, "Manifest could not be saved")
                    .with_recommendation("Check permissions and free space in the manifest directory."),
            ),
            (
                codes::MANIFEST_SAVED,
                IncidentDefinition::new(Info, "Manifest saved"),
            ),
            (codes::UNKNOWN_INCIDENT, IncidentDefinition::unknown()),
        ];

        Self {
            definitions: entries
                .into_iter()
                .map(|(code, def)| (code.to_string(), def))
                .collect(),
        }
    }

    /// Parses a catalog from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or contains an empty code.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let definitions: HashMap<String, IncidentDefinition> = serde_json::from_str(json)?;
        if definitions.keys().any(|code| code.trim().is_empty()) {
            return Err(CatalogError::EmptyCode);
        }
        Ok(Self { definitions })
    }

    /// Loads a catalog file and layers it over the built-in codes.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut catalog = Self::builtin();
        catalog.extend(Self::from_json_str(&text)?);
        Ok(catalog)
    }

    /// Adds or replaces a definition.
    pub fn insert(&mut self, code: impl Into<String>, definition: IncidentDefinition) {
        self.definitions.insert(code.into(), definition);
    }

    /// Adds or replaces a definition, builder style.
    #[must_use]
    pub fn with_definition(mut self, code: impl Into<String>, definition: IncidentDefinition) -> Self {
        self.insert(code, definition);
        self
    }

    /// Merges `other` into `self`; entries from `other` win.
    pub fn extend(&mut self, other: Self) {
        self.definitions.extend(other.definitions);
    }

    /// Looks up a code.
    #[must_use]
    pub fn resolve(&self, code: &str) -> Option<&IncidentDefinition> {
        self.definitions.get(code)
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns true if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_orchestrator_codes() {
        let catalog = IncidentCatalog::builtin();
        for code in [
            codes::STAGE_SEQUENCE_MISMATCH,
            codes::HANDLER_FAULT,
            codes::INPUT_REQUIRED,
            codes::MANIFEST_PARSE_FAILED,
            codes::MANIFEST_SAVE_FAILED,
            codes::UNKNOWN_INCIDENT,
        ] {
            assert!(catalog.resolve(code).is_some(), "missing {code}");
        }
        assert_eq!(
            catalog.resolve(codes::HANDLER_FAULT).map(|d| d.severity),
            Some(Severity::Fatal)
        );
    }

    #[test]
    fn test_from_json_str_accepts_both_key_styles() {
        let catalog = IncidentCatalog::from_json_str(
            r#"{
                "VAL-001": {"Severity": "Error", "DefaultMessage": "Bad header", "DefaultRecommendation": "Fix the header"},
                "VAL-002": {"severity": "warning", "message": "Trailing blank line"}
            }"#,
        )
        .unwrap();

        let first = catalog.resolve("VAL-001").unwrap();
        assert_eq!(first.severity, Severity::Error);
        assert_eq!(first.default_recommendation.as_deref(), Some("Fix the header"));

        let second = catalog.resolve("VAL-002").unwrap();
        assert_eq!(second.severity, Severity::Warning);
        assert_eq!(second.default_message, "Trailing blank line");
        assert!(second.default_recommendation.is_none());
    }

    #[test]
    fn test_from_json_str_rejects_empty_code() {
        let err = IncidentCatalog::from_json_str(r#"{"": {"Severity": "Info"}}"#).unwrap_err();
        assert!(matches!(err, CatalogError::EmptyCode));
    }

    #[test]
    fn test_load_layers_over_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("codes.json");
        std::fs::write(
            &path,
            r#"{"ORCH-STAGE-SKIPPED": {"Severity": "Warning", "DefaultMessage": "Skipped"},
                "XFER-001": {"Severity": "Error", "DefaultMessage": "Upload rejected"}}"#,
        )
        .unwrap();

        let catalog = IncidentCatalog::load(&path).unwrap();
        assert_eq!(
            catalog.resolve(codes::STAGE_SKIPPED).map(|d| d.severity),
            Some(Severity::Warning)
        );
        assert!(catalog.resolve("XFER-001").is_some());
        assert!(catalog.resolve(codes::HANDLER_FAULT).is_some());
    }

    #[test]
    fn test_load_missing_file() {
        let err = IncidentCatalog::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }
}
