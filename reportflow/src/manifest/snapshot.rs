//! Back-reference stripping and nesting depth for persisted documents.

use super::Manifest;
use serde_json::{Map, Value};

/// Object keys that point back at an owning object.
pub const BACK_REFERENCE_KEYS: &[&str] = &["Parent", "parent", "_parent"];

/// Removes references to owning objects before persistence.
///
/// Implementations recurse into every nested value.
pub trait BackReference {
    /// Strips back-references in place and returns how many were removed.
    fn strip_back_references(&mut self) -> usize;
}

impl BackReference for Map<String, Value> {
    fn strip_back_references(&mut self) -> usize {
        let mut removed = 0;
        for key in BACK_REFERENCE_KEYS {
            if self.remove(*key).is_some() {
                removed += 1;
            }
        }
        removed
            + self
                .values_mut()
                .map(BackReference::strip_back_references)
                .sum::<usize>()
    }
}

impl BackReference for Value {
    fn strip_back_references(&mut self) -> usize {
        match self {
            Self::Object(map) => map.strip_back_references(),
            Self::Array(items) => items
                .iter_mut()
                .map(BackReference::strip_back_references)
                .sum(),
            _ => 0,
        }
    }
}

impl BackReference for Manifest {
    fn strip_back_references(&mut self) -> usize {
        self.data.strip_back_references() + self.metrics.strip_back_references()
    }
}

/// Returns the container nesting depth of `value`.
///
/// Scalars have depth 0; an object or array is one deeper than its deepest
/// child.
#[must_use]
pub fn json_depth(value: &Value) -> usize {
    let mut max = 0;
    let mut stack = vec![(value, 0usize)];
    while let Some((value, depth)) = stack.pop() {
        match value {
            Value::Object(map) => {
                max = max.max(depth + 1);
                stack.extend(map.values().map(|v| (v, depth + 1)));
            }
            Value::Array(items) => {
                max = max.max(depth + 1);
                stack.extend(items.iter().map(|v| (v, depth + 1)));
            }
            _ => {}
        }
    }
    max
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_strip_nested_back_references() {
        let mut value = json!({
            "Parent": {"huge": true},
            "rows": [
                {"id": 1, "parent": {"id": 0}},
                {"id": 2, "children": [{"_parent": null, "id": 3}]}
            ]
        });

        assert_eq!(value.strip_back_references(), 3);
        assert_eq!(
            value,
            json!({"rows": [{"id": 1}, {"id": 2, "children": [{"id": 3}]}]})
        );
    }

    #[test]
    fn test_strip_manifest() {
        let mut manifest = Manifest::new("Discover");
        manifest.set_data("batch", json!({"Parent": "ctx", "files": 3}));
        manifest.set_metric("Parent", "ctx");

        assert_eq!(manifest.strip_back_references(), 2);
        assert_eq!(manifest.data["batch"], json!({"files": 3}));
        assert!(manifest.metrics.is_empty());
    }

    #[test]
    fn test_json_depth() {
        assert_eq!(json_depth(&json!(1)), 0);
        assert_eq!(json_depth(&json!({})), 1);
        assert_eq!(json_depth(&json!({"a": [1, {"b": []}]})), 4);
    }

    #[test]
    fn test_json_depth_deep_chain() {
        let mut value = json!(null);
        for _ in 0..500 {
            value = json!([value]);
        }
        assert_eq!(json_depth(&value), 500);
    }
}
