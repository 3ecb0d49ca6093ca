//! In-process cache statistics
//!
//! Running counters for hits, misses, and total requests, globally and
//! per model. State lives in process memory only and is never persisted;
//! it is initialized to zero at construction and survives independently
//! of the store's contents (clearing the cache does not touch it).

use std::collections::BTreeMap;

use domain::ModelId;
use parking_lot::Mutex;
use serde::Serialize;

/// Hit/miss counters for one model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ModelCounters {
    pub hits: u64,
    pub misses: u64,
}

impl ModelCounters {
    /// Requests seen for this model
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Point-in-time copy of the tracker's counters
#[derive(Debug, Clone, Default, Serialize)]
pub struct StatsSnapshot {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    pub per_model: BTreeMap<ModelId, ModelCounters>,
}

impl StatsSnapshot {
    /// Fraction of requests served from the cache (0.0 when no requests)
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.hits as f64 / self.total_requests as f64
        }
    }
}

#[derive(Debug, Default)]
struct StatsInner {
    hits: u64,
    misses: u64,
    per_model: BTreeMap<ModelId, ModelCounters>,
}

/// Thread-safe hit/miss tracker
///
/// Increments are taken under one mutex so concurrent callers never lose
/// updates. Counters are also mirrored to the `metrics` facade for the
/// pull-based exporter.
#[derive(Debug, Default)]
pub struct StatsTracker {
    inner: Mutex<StatsInner>,
}

impl StatsTracker {
    /// Create a tracker with all counters at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a cache hit for `model`
    pub fn record_hit(&self, model: &ModelId) {
        {
            let mut inner = self.inner.lock();
            inner.hits += 1;
            inner.per_model.entry(model.clone()).or_default().hits += 1;
        }
        metrics::counter!("embedding_cache_hits_total", "model" => model.to_string()).increment(1);
    }

    /// Record a cache miss for `model`
    pub fn record_miss(&self, model: &ModelId) {
        {
            let mut inner = self.inner.lock();
            inner.misses += 1;
            inner.per_model.entry(model.clone()).or_default().misses += 1;
        }
        metrics::counter!("embedding_cache_misses_total", "model" => model.to_string())
            .increment(1);
    }

    /// Copy the current counters
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        let inner = self.inner.lock();
        StatsSnapshot {
            total_requests: inner.hits + inner.misses,
            hits: inner.hits,
            misses: inner.misses,
            per_model: inner.per_model.clone(),
        }
    }

    /// Zero all counters
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        *inner = StatsInner::default();
    }
}
