//! Stage numbers and incident attribution keys.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// The number identifying a stage within the fixed, ascending stage domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StageNumber(pub u32);

impl StageNumber {
    /// Returns the raw number.
    #[must_use]
    pub fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for StageNumber {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl fmt::Display for StageNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for StageNumber {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Who an incident is attributed to.
///
/// Incidents raised outside a stage's execution window (sequencing checks,
/// manifest persistence at stop, handler faults caught by the driver after
/// the stage closed) belong to the `Orchestrator` pseudo-stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StageKey {
    /// The orchestration pseudo-stage.
    #[default]
    Orchestrator,
    /// A numbered pipeline stage.
    Stage(StageNumber),
}

impl StageKey {
    /// Returns the stage number, if this key names a stage.
    #[must_use]
    pub fn stage_number(self) -> Option<StageNumber> {
        match self {
            Self::Orchestrator => None,
            Self::Stage(n) => Some(n),
        }
    }
}

impl From<StageNumber> for StageKey {
    fn from(value: StageNumber) -> Self {
        Self::Stage(value)
    }
}

impl fmt::Display for StageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Orchestrator => write!(f, "orchestrator"),
            Self::Stage(n) => write!(f, "stage-{n}"),
        }
    }
}

/// Error returned when a stage key string is malformed.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Invalid stage key '{0}'")]
pub struct ParseStageKeyError(String);

impl FromStr for StageKey {
    type Err = ParseStageKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "orchestrator" {
            return Ok(Self::Orchestrator);
        }
        s.strip_prefix("stage-")
            .and_then(|n| n.parse::<StageNumber>().ok())
            .map(Self::Stage)
            .ok_or_else(|| ParseStageKeyError(s.to_string()))
    }
}

impl Serialize for StageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for StageKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
