//! Static stage descriptors.

use crate::core::StageNumber;
use serde::{Deserialize, Serialize};

const fn default_true() -> bool {
    true
}

/// Read-only description of one stage in the fixed pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Position in the numeric stage domain.
    pub number: StageNumber,
    /// Stage name; also the handler registry key.
    pub name: String,
    /// Manifest type this stage reads as input.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_from: Option<String>,
    /// Whether a missing input manifest aborts the run.
    #[serde(default = "default_true")]
    pub input_required: bool,
    /// Whether the stage produces a manifest.
    #[serde(default)]
    pub has_manifest: bool,
    /// Output manifest type; defaults to the stage name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_type: Option<String>,
    /// Stage number expected to run after this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_stage: Option<StageNumber>,
}

impl StageDefinition {
    /// Creates a stage with no input and no output manifest.
    #[must_use]
    pub fn new(number: u32, name: impl Into<String>) -> Self {
        Self {
            number: StageNumber(number),
            name: name.into(),
            input_from: None,
            input_required: true,
            has_manifest: false,
            manifest_type: None,
            next_stage: None,
        }
    }

    /// Declares a required input manifest type.
    #[must_use]
    pub fn with_input(mut self, manifest_type: impl Into<String>) -> Self {
        self.input_from = Some(manifest_type.into());
        self
    }

    /// Marks the declared input as optional.
    #[must_use]
    pub fn with_optional_input(mut self) -> Self {
        self.input_required = false;
        self
    }

    /// Declares that the stage produces a manifest typed after its name.
    #[must_use]
    pub fn with_manifest(mut self) -> Self {
        self.has_manifest = true;
        self
    }

    /// Declares that the stage produces a manifest of the given type.
    #[must_use]
    pub fn with_manifest_type(mut self, manifest_type: impl Into<String>) -> Self {
        self.has_manifest = true;
        self.manifest_type = Some(manifest_type.into());
        self
    }

    /// Sets the declared next stage.
    #[must_use]
    pub fn with_next_stage(mut self, next: u32) -> Self {
        self.next_stage = Some(StageNumber(next));
        self
    }

    /// Returns the output manifest type.
    #[must_use]
    pub fn output_type(&self) -> &str {
        self.manifest_type.as_deref().unwrap_or(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_json() {
        let def: StageDefinition =
            serde_json::from_str(r#"{"number": 20, "name": "Validate", "input_from": "Discover"}"#)
                .unwrap();

        assert_eq!(def.number, StageNumber(20));
        assert!(def.input_required);
        assert!(!def.has_manifest);
        assert_eq!(def.output_type(), "Validate");
        assert_eq!(def.next_stage, None);
    }

    #[test]
    fn test_builder() {
        let def = StageDefinition::new(30, "Transform")
            .with_input("Validate")
            .with_optional_input()
            .with_manifest_type("Transformed")
            .with_next_stage(40);

        assert!(!def.input_required);
        assert!(def.has_manifest);
        assert_eq!(def.output_type(), "Transformed");
        assert_eq!(def.next_stage, Some(StageNumber(40)));
    }
}
