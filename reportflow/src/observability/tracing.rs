//! Subscriber setup, stage spans and timing.

use crate::core::{Severity, StageNumber};
use std::time::Instant;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};
use uuid::Uuid;

/// Initialises the global tracing subscriber.
///
/// `RUST_LOG` wins over `level` when set. Only the first call in a process
/// takes effect.
pub fn init_tracing(level: Severity, json: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.tracing_level().as_str()));

    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false).json())
            .try_init()
            .ok();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .try_init()
            .ok();
    }
}

/// Span covering one stage's handler.
#[must_use]
pub fn stage_span(execution_id: Uuid, number: StageNumber, name: &str) -> Span {
    tracing::info_span!("stage", %execution_id, stage = number.get(), name)
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Returns the span name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Finishes the span and returns the duration.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start("Validate");
        std::thread::sleep(std::time::Duration::from_millis(5));
        assert_eq!(timer.name(), "Validate");
        assert!(timer.finish() >= 5.0);
    }

    #[test]
    fn test_init_tracing_twice_is_harmless() {
        init_tracing(Severity::Debug, false);
        init_tracing(Severity::Info, true);
        let span = stage_span(Uuid::new_v4(), StageNumber(10), "Discover");
        let _entered = span.enter();
    }
}
