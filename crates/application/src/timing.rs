//! Scoped request timing
//!
//! A drop guard that records the duration and outcome of a cache request
//! on every exit path. Callers mark the outcome before returning; a guard
//! dropped without a mark (early `?` return) records an error outcome, so
//! failed requests are never missing from the duration histogram.

use std::time::Instant;

use domain::ModelId;

/// Outcome of a timed cache request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Hit,
    Miss,
    Error,
}

impl RequestOutcome {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Hit => "hit",
            Self::Miss => "miss",
            Self::Error => "error",
        }
    }
}

/// Drop guard timing one `get_or_compute` call
#[derive(Debug)]
pub struct RequestTimer {
    start: Instant,
    model: ModelId,
    outcome: RequestOutcome,
}

impl RequestTimer {
    /// Start timing a request for `model`
    #[must_use]
    pub fn start(model: ModelId) -> Self {
        Self {
            start: Instant::now(),
            model,
            outcome: RequestOutcome::Error,
        }
    }

    /// Set the outcome recorded when this guard drops
    pub fn mark(&mut self, outcome: RequestOutcome) {
        self.outcome = outcome;
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        metrics::histogram!(
            "embedding_cache_request_duration_seconds",
            "model" => self.model.to_string(),
            "outcome" => self.outcome.as_str(),
        )
        .record(self.start.elapsed().as_secs_f64());
    }
}
