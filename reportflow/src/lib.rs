//! # Reportflow
//!
//! Sequential stage orchestration for compliance-reporting pipelines.
//!
//! A pipeline is a fixed, ascending list of numbered stages. Reportflow
//! provides:
//!
//! - **A fail-fast driver**: runs a bounded slice of the stage list, records
//!   skipped stages, and aborts after the first stage that raised a Fatal
//!   incident
//! - **Manifests**: stage work products persisted as JSON and recovered from
//!   memory, an explicit path, or the newest recent file on disk
//! - **Incident routing**: every reportable event is classified through a
//!   catalog, filtered by severity, counted per stage and logged
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use reportflow::prelude::*;
//!
//! let config = Arc::new(PipelineConfig::from_file("pipeline.json")?);
//! let catalog = Arc::new(config.load_catalog()?);
//!
//! let registry = StageRegistry::new()
//!     .with_handler(DiscoverStage::new())
//!     .with_handler(ValidateStage::new());
//!
//! let request = RunRequest::new().with_start(10).with_stop(50).with_skip(30);
//! let report = Orchestrator::new(registry).run(config, catalog, &request).await;
//! std::process::exit(report.exit_code());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod incidents;
pub mod lifecycle;
pub mod manifest;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{LoadedPipeline, PipelineConfig};
    pub use crate::context::{RunContext, RunIdentity};
    pub use crate::core::{Severity, SeverityCounts, StageKey, StageNumber, StageOutcome, StageState};
    pub use crate::errors::{CatalogError, ConfigError, ReportflowError};
    pub use crate::events::{
        CollectingIncidentSink, IncidentSink, JsonLinesIncidentSink, NoOpIncidentSink,
        TracingIncidentSink,
    };
    pub use crate::incidents::{
        codes, Incident, IncidentCatalog, IncidentDefinition, IncidentReport, IncidentRouter,
    };
    pub use crate::manifest::{Manifest, ManifestStore, ManifestTemplate};
    pub use crate::pipeline::{Orchestrator, RunPlan, RunReport, RunRequest};
    pub use crate::stages::{FnStage, NoOpStage, StageDefinition, StageHandler, StageRegistry};
    pub use std::sync::Arc;
}
