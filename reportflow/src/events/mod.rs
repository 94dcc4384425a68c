//! Incident sinks.
//!
//! A sink is where incidents that pass the logging threshold end up. Each run
//! context owns its sink, so two runs in one process never share log state.

mod sink;

pub use sink::{
    CollectingIncidentSink, IncidentSink, JsonLinesIncidentSink, NoOpIncidentSink,
    TracingIncidentSink,
};

#[cfg(test)]
pub use sink::MockIncidentSink;
