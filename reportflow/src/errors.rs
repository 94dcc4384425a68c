//! Error types for the reportflow crate.
//!
//! Only configuration and catalog loading return errors to callers. Manifest
//! errors never leave the store: they are converted into incidents there.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for reportflow operations.
#[derive(Debug, Error)]
pub enum ReportflowError {
    /// The pipeline configuration is invalid or unreadable.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// The incident catalog is invalid or unreadable.
    #[error("{0}")]
    Catalog(#[from] CatalogError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating a [`crate::config::PipelineConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Cannot read config file {path}: {source}")]
    Read {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid JSON for the expected shape.
    #[error("Cannot parse config file {path}: {source}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// No stages were configured.
    #[error("Pipeline '{0}' has no stages")]
    NoStages(String),

    /// Stage numbers are not strictly ascending.
    #[error("Stage {current} is declared after stage {previous}; stage numbers must be strictly ascending")]
    StageOrder {
        /// The previously declared stage number.
        previous: u32,
        /// The offending stage number.
        current: u32,
    },

    /// Two stages share a name.
    #[error("Duplicate stage name '{0}'")]
    DuplicateStageName(String),

    /// A stage name or manifest type contains characters that would make
    /// manifest file names ambiguous.
    #[error("Invalid identifier '{value}' for {field}: only letters, digits, '.' and '-' are allowed")]
    InvalidIdentifier {
        /// Which field carried the value.
        field: &'static str,
        /// The rejected value.
        value: String,
    },

    /// A numeric limit is out of range.
    #[error("Invalid value for {field}: {reason}")]
    InvalidLimit {
        /// The field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

/// Errors raised while loading an incident catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read.
    #[error("Cannot read incident catalog {path}: {source}")]
    Read {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The catalog is not valid JSON for the expected shape.
    #[error("Cannot parse incident catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// A catalog entry has an empty code.
    #[error("Incident catalog contains an empty code")]
    EmptyCode,
}

/// Failures inside the manifest store.
///
/// These are reported as incidents by the store and are never returned from
/// its public operations.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("Cannot read manifest {path}: {source}")]
    Read {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest file is not a valid manifest document.
    #[error("Cannot parse manifest {path}: {source}")]
    Parse {
        /// The file path.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },

    /// The manifest parsed but carries a different type.
    #[error("Manifest {path} has type '{found}', expected '{expected}'")]
    TypeMismatch {
        /// The file path.
        path: PathBuf,
        /// The expected type.
        expected: String,
        /// The type found in the file.
        found: String,
    },

    /// The manifest nests deeper than the configured limit.
    #[error("Manifest '{manifest_type}' nests {depth} levels deep, limit is {limit}")]
    DepthExceeded {
        /// The manifest type.
        manifest_type: String,
        /// The measured depth.
        depth: usize,
        /// The configured limit.
        limit: usize,
    },

    /// The manifest could not be serialized.
    #[error("Cannot serialize manifest '{manifest_type}': {source}")]
    Serialize {
        /// The manifest type.
        manifest_type: String,
        /// The underlying serialization error.
        #[source]
        source: serde_json::Error,
    },

    /// The manifest file could not be written.
    #[error("Cannot write manifest {path}: {source}")]
    Write {
        /// The file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest directory could not be listed.
    #[error("Cannot list manifest directory {path}: {source}")]
    ListDir {
        /// The directory path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },
}
