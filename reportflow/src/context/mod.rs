//! Run context.
//!
//! A [`RunContext`] is created once per run and holds everything the
//! lifecycle, the manifest store, the incident router and stage handlers
//! share: identity, configuration, incident ledgers and counters, the
//! manifest cache and working slots, and per-stage results.

mod identity;
mod run;

pub use identity::RunIdentity;
pub(crate) use run::ActiveStage;
pub use run::RunContext;
