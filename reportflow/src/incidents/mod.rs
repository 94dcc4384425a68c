//! Incident & severity routing.
//!
//! Every reportable event in a run goes through [`IncidentRouter::register`]:
//! - the code is resolved against the [`IncidentCatalog`]
//! - reports below the tracking threshold are dropped
//! - tracked incidents are stored per stage and severity, and counted
//! - Error and Fatal incidents mark the stage (and, for Fatal, the run)

pub mod codes;
mod catalog;
mod incident;
mod ledger;
mod router;

pub use catalog::{IncidentCatalog, IncidentDefinition};
pub use incident::{ErrorRecord, Incident, IncidentReport};
pub use ledger::IncidentLedger;
pub use router::IncidentRouter;
