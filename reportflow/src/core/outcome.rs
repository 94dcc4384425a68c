//! The value a stage handler returns.

use serde::{Deserialize, Serialize};

/// What a stage handler reports back to the driver.
///
/// Expected failures should be registered as incidents on the run context;
/// `errors` carries the handler's own human-readable messages and is copied
/// into the stage result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageOutcome {
    /// Whether the handler considers its work done.
    pub success: bool,

    /// Opaque handler data, kept on the stage result.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub data: serde_json::Value,

    /// Handler-reported error messages.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl Default for StageOutcome {
    fn default() -> Self {
        Self::ok()
    }
}

impl StageOutcome {
    /// Creates a successful outcome with no data.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            success: true,
            data: serde_json::Value::Null,
            errors: Vec::new(),
        }
    }

    /// Creates a successful outcome carrying data.
    #[must_use]
    pub fn ok_with_data(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data,
            errors: Vec::new(),
        }
    }

    /// Creates a failed outcome with a single error message.
    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            data: serde_json::Value::Null,
            errors: vec![error.into()],
        }
    }

    /// Adds an error message.
    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }

    /// Replaces the data.
    #[must_use]
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = data;
        self
    }
}
