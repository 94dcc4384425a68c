//! The manifest document.

use crate::utils::{now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// A stage's persisted work product.
///
/// Serialized with PascalCase keys. Immutable once saved: the store assigns
/// `SaveName` and `SavePath` when it writes the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
    /// Manifest type; also the file name prefix.
    #[serde(rename = "Type")]
    pub manifest_type: String,
    /// Creation time.
    pub date_generated: Timestamp,
    /// `SaveName` of the manifest this one was derived from.
    #[serde(default)]
    pub input_manifest: Option<String>,
    /// Directory the manifest was (or will be) saved to.
    #[serde(default)]
    pub save_path: Option<PathBuf>,
    /// `<Type>_<yyyyMMdd_HHmmss>`, set on save.
    #[serde(default)]
    pub save_name: Option<String>,
    /// Stage payload.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Stage counters.
    #[serde(default)]
    pub metrics: Map<String, Value>,
}

impl Manifest {
    /// Creates an empty manifest of the given type.
    #[must_use]
    pub fn new(manifest_type: impl Into<String>) -> Self {
        Self {
            manifest_type: manifest_type.into(),
            date_generated: now_utc(),
            input_manifest: None,
            save_path: None,
            save_name: None,
            data: Map::new(),
            metrics: Map::new(),
        }
    }

    /// Applies a template's skeleton data and metrics.
    #[must_use]
    pub fn with_template(mut self, template: &ManifestTemplate) -> Self {
        self.data = template.data.clone();
        self.metrics = template.metrics.clone();
        self
    }

    /// Sets a data entry.
    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    /// Sets a metric entry.
    pub fn set_metric(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.metrics.insert(key.into(), value.into());
    }

    /// Adds `by` to an integer metric, starting from zero.
    pub fn increment_metric(&mut self, key: &str, by: i64) {
        let current = self.metrics.get(key).and_then(Value::as_i64).unwrap_or(0);
        self.metrics.insert(key.to_string(), Value::from(current + by));
    }

    /// Returns true once the store has written the manifest.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.save_name.is_some()
    }

    /// Returns the full file path, once saved.
    #[must_use]
    pub fn file_path(&self) -> Option<PathBuf> {
        let dir = self.save_path.as_ref()?;
        let name = self.save_name.as_ref()?;
        Some(dir.join(format!("{name}.json")))
    }

    /// File name prefix shared by every manifest of `manifest_type`.
    #[must_use]
    pub fn file_prefix(manifest_type: &str) -> String {
        format!("{manifest_type}_")
    }
}

/// Skeleton `Data` and `Metrics` for a manifest type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ManifestTemplate {
    /// Initial data.
    #[serde(default)]
    pub data: Map<String, Value>,
    /// Initial metrics.
    #[serde(default)]
    pub metrics: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pascal_case_keys() {
        let mut manifest = Manifest::new("Discover");
        manifest.set_data("files", json!(["a.csv"]));
        manifest.increment_metric("files_found", 2);
        manifest.increment_metric("files_found", 1);

        let value = serde_json::to_value(&manifest).unwrap();
        for key in [
            "Type",
            "DateGenerated",
            "InputManifest",
            "SavePath",
            "SaveName",
            "Data",
            "Metrics",
        ] {
            assert!(value.get(key).is_some(), "missing {key}");
        }
        assert_eq!(value["Type"], "Discover");
        assert_eq!(value["Metrics"]["files_found"], 3);
    }

    #[test]
    fn test_parse_minimal_document() {
        let manifest: Manifest = serde_json::from_str(
            r#"{"Type": "Validate", "DateGenerated": "2024-03-01T10:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(manifest.manifest_type, "Validate");
        assert!(manifest.data.is_empty());
        assert!(!manifest.is_saved());
        assert!(manifest.file_path().is_none());
    }

    #[test]
    fn test_template_and_file_path() {
        let template: ManifestTemplate =
            serde_json::from_value(json!({"data": {"rows": []}, "metrics": {"rows": 0}})).unwrap();
        let mut manifest = Manifest::new("Transform").with_template(&template);
        manifest.save_path = Some(PathBuf::from("/data/manifests"));
        manifest.save_name = Some("Transform_20240301_100000".to_string());

        assert_eq!(manifest.data["rows"], json!([]));
        assert_eq!(
            manifest.file_path(),
            Some(PathBuf::from("/data/manifests/Transform_20240301_100000.json"))
        );
        assert_eq!(Manifest::file_prefix("Transform"), "Transform_");
    }
}
