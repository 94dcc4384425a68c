//! Run identity.

use crate::utils::{generate_execution_id, now_utc, Timestamp};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunIdentity {
    /// Unique id of the run (UUID v4).
    pub execution_id: Uuid,
    /// When the run started.
    pub started_at: Timestamp,
}

impl Default for RunIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl RunIdentity {
    /// Creates a run identity with a fresh execution id, started now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_execution_id(generate_execution_id())
    }

    /// Creates a run identity with a specific execution id, started now.
    #[must_use]
    pub fn with_execution_id(execution_id: Uuid) -> Self {
        Self {
            execution_id,
            started_at: now_utc(),
        }
    }
}
