//! Incident severities and per-severity counters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Severity of an incident, totally ordered from `Debug` to `Fatal`.
///
/// - `Debug` / `Info`: no impact on the run.
/// - `Warning`: the stage continues but is flagged for review.
/// - `Error`: the current stage is marked failed; the run continues.
/// - `Fatal`: the run aborts once the active stage has stopped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum Severity {
    /// Diagnostic detail.
    #[serde(alias = "debug", alias = "DEBUG")]
    Debug,
    /// Informational event.
    #[default]
    #[serde(alias = "info", alias = "INFO")]
    Info,
    /// Something needs review; the stage continues.
    #[serde(alias = "warning", alias = "WARNING", alias = "warn")]
    Warning,
    /// The current stage failed.
    #[serde(alias = "error", alias = "ERROR")]
    Error,
    /// The run cannot continue.
    #[serde(alias = "fatal", alias = "FATAL")]
    Fatal,
}

impl Severity {
    /// All severities in ascending order.
    pub const ALL: [Self; 5] = [
        Self::Debug,
        Self::Info,
        Self::Warning,
        Self::Error,
        Self::Fatal,
    ];

    /// Returns true for `Error` and `Fatal`.
    #[must_use]
    pub fn is_failure(self) -> bool {
        self >= Self::Error
    }

    /// Returns the matching `tracing` level.
    #[must_use]
    pub fn tracing_level(self) -> tracing::Level {
        match self {
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warning => tracing::Level::WARN,
            Self::Error | Self::Fatal => tracing::Level::ERROR,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "Debug"),
            Self::Info => write!(f, "Info"),
            Self::Warning => write!(f, "Warning"),
            Self::Error => write!(f, "Error"),
            Self::Fatal => write!(f, "Fatal"),
        }
    }
}

/// Error returned when a severity name is not recognised.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Unknown severity '{0}' (expected Debug, Info, Warning, Error or Fatal)")]
pub struct ParseSeverityError(String);

impl FromStr for Severity {
    type Err = ParseSeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" | "verbose" => Ok(Self::Debug),
            "info" | "information" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warning),
            "error" => Ok(Self::Error),
            "fatal" | "critical" => Ok(Self::Fatal),
            _ => Err(ParseSeverityError(s.to_string())),
        }
    }
}

/// Incident counts per severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    /// Debug incidents.
    #[serde(default)]
    pub debug: u32,
    /// Info incidents.
    #[serde(default)]
    pub info: u32,
    /// Warning incidents.
    #[serde(default)]
    pub warning: u32,
    /// Error incidents.
    #[serde(default)]
    pub error: u32,
    /// Fatal incidents.
    #[serde(default)]
    pub fatal: u32,
}

impl SeverityCounts {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&mut self, severity: Severity) -> &mut u32 {
        match severity {
            Severity::Debug => &mut self.debug,
            Severity::Info => &mut self.info,
            Severity::Warning => &mut self.warning,
            Severity::Error => &mut self.error,
            Severity::Fatal => &mut self.fatal,
        }
    }

    /// Increments the counter for `severity`.
    pub fn increment(&mut self, severity: Severity) {
        let slot = self.slot(severity);
        *slot = slot.saturating_add(1);
    }

    /// Returns the counter for `severity`.
    #[must_use]
    pub fn get(&self, severity: Severity) -> u32 {
        match severity {
            Severity::Debug => self.debug,
            Severity::Info => self.info,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
            Severity::Fatal => self.fatal,
        }
    }

    /// Returns the sum of all counters.
    #[must_use]
    pub fn total(&self) -> u32 {
        Severity::ALL.iter().map(|s| self.get(*s)).sum()
    }

    /// Adds every counter of `other` into `self`.
    pub fn merge(&mut self, other: &Self) {
        for severity in Severity::ALL {
            let slot = self.slot(severity);
            *slot = slot.saturating_add(other.get(severity));
        }
    }

    /// Returns true if any Error or Fatal was counted.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.error > 0 || self.fatal > 0
    }
}

impl fmt::Display for SeverityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = Severity::ALL
            .iter()
            .map(|s| format!("{s}={}", self.get(*s)))
            .collect();
        write!(f, "{}", parts.join(" "))
    }
}
