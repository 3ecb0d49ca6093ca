//! Embedding cache service
//!
//! The public face of the cache: resolves get-or-compute requests against
//! the durable store, keeps in-process hit/miss statistics, and exposes
//! the retention operations. Statistics lifetime is deliberately decoupled
//! from store lifetime so an operator can clear stale vectors without
//! losing historical hit-rate telemetry, and vice versa.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{Duration, Utc};
use domain::{CacheEntry, CacheKey, DomainError, ModelId};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApplicationError,
    ports::{EmbeddingProvider, EmbeddingStore},
    stats::{ModelCounters, StatsTracker},
    timing::{RequestOutcome, RequestTimer},
};

/// Combined statistics report for monitoring and the admin surface
#[derive(Debug, Clone, Serialize)]
pub struct CacheReport {
    pub total_requests: u64,
    pub hits: u64,
    pub misses: u64,
    /// Fraction of requests served from the cache, 0.0 when no requests
    pub hit_rate: f64,
    /// Live entry count in the store (independent of the counters above)
    pub entry_count: u64,
    pub per_model: BTreeMap<ModelId, ModelCounters>,
}

type KeyLocks = HashMap<CacheKey, Arc<Mutex<()>>>;

/// Cache manager coordinating store, provider, and statistics
///
/// Concurrent misses for the same key are single-flighted: the first
/// caller computes while the rest wait on a per-key lock and then find
/// the stored entry. Writes to distinct keys are fully independent. If a
/// residual race does double-compute, the provider is deterministic, so
/// the last write overwrites with an equal vector.
pub struct EmbeddingCacheService<S, P>
where
    S: EmbeddingStore,
    P: EmbeddingProvider,
{
    store: Arc<S>,
    provider: Arc<P>,
    stats: Arc<StatsTracker>,
    inflight: Arc<Mutex<KeyLocks>>,
}

impl<S, P> Clone for EmbeddingCacheService<S, P>
where
    S: EmbeddingStore,
    P: EmbeddingProvider,
{
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            provider: Arc::clone(&self.provider),
            stats: Arc::clone(&self.stats),
            inflight: Arc::clone(&self.inflight),
        }
    }
}

impl<S, P> std::fmt::Debug for EmbeddingCacheService<S, P>
where
    S: EmbeddingStore,
    P: EmbeddingProvider,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingCacheService")
            .finish_non_exhaustive()
    }
}

impl<S, P> EmbeddingCacheService<S, P>
where
    S: EmbeddingStore,
    P: EmbeddingProvider,
{
    /// Create a service with fresh (zeroed) statistics
    #[must_use]
    pub fn new(store: Arc<S>, provider: Arc<P>) -> Self {
        Self {
            store,
            provider,
            stats: Arc::new(StatsTracker::new()),
            inflight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the cached embedding for `(text, model)`, computing and
    /// storing it on a miss
    ///
    /// The returned vector is always the result of a prior or the current
    /// provider call for exactly this `(text, model)` pair. A failed
    /// provider call propagates unchanged, writes no entry, and leaves
    /// the hit/miss counters untouched: only requests that complete with
    /// a vector are counted.
    #[instrument(skip(self, text), fields(model = %model, text_len = text.len()))]
    pub async fn get_or_compute(
        &self,
        text: &str,
        model: &ModelId,
    ) -> Result<Vec<f32>, ApplicationError> {
        if text.trim().is_empty() {
            return Err(DomainError::EmptyText.into());
        }

        let key = CacheKey::for_text(model.clone(), text);
        let mut timer = RequestTimer::start(model.clone());

        if let Some(entry) = self.store.get(&key).await? {
            let vector = self.serve_hit(entry).await?;
            timer.mark(RequestOutcome::Hit);
            return Ok(vector);
        }

        // Miss: serialize computation per key so concurrent callers for
        // the same text share one provider call.
        let lock = self.key_lock(&key).await;
        let result = {
            let _guard = lock.lock().await;
            self.compute_under_lock(&key, text, model, &mut timer).await
        };
        drop(lock);
        self.release_key_lock(&key).await;

        result
    }

    /// Double-checked miss path, entered while holding the key lock
    async fn compute_under_lock(
        &self,
        key: &CacheKey,
        text: &str,
        model: &ModelId,
        timer: &mut RequestTimer,
    ) -> Result<Vec<f32>, ApplicationError> {
        // Another caller may have finished while we waited.
        if let Some(entry) = self.store.get(key).await? {
            let vector = self.serve_hit(entry).await?;
            timer.mark(RequestOutcome::Hit);
            return Ok(vector);
        }

        debug!(key = %key, "Cache miss, invoking embedding provider");
        let vector = self.provider.embed(text, model).await?;
        let entry = CacheEntry::new(key.clone(), vector.clone(), Utc::now());
        self.store.put(&entry).await?;
        self.stats.record_miss(model);
        timer.mark(RequestOutcome::Miss);
        Ok(vector)
    }

    /// Current statistics plus the live entry count
    pub async fn stats(&self) -> Result<CacheReport, ApplicationError> {
        let snapshot = self.stats.snapshot();
        let entry_count = self.store.count().await?;
        Ok(CacheReport {
            total_requests: snapshot.total_requests,
            hits: snapshot.hits,
            misses: snapshot.misses,
            hit_rate: snapshot.hit_rate(),
            entry_count,
            per_model: snapshot.per_model,
        })
    }

    /// Remove all entries; returns the number removed
    ///
    /// Statistics are not reset: they reflect historical request volume,
    /// independent of current store contents. Use [`Self::reset_stats`]
    /// for the counters.
    #[instrument(skip(self))]
    pub async fn clear_cache(&self) -> Result<u64, ApplicationError> {
        let removed = self.store.delete_all().await?;
        info!(removed, "Cleared embedding cache");
        Ok(removed)
    }

    /// Remove entries not accessed within `older_than`; returns the count
    ///
    /// This is the only eviction mechanism; nothing expires passively.
    #[instrument(skip(self))]
    pub async fn cleanup(&self, older_than: Duration) -> Result<u64, ApplicationError> {
        let threshold = Utc::now() - older_than;
        let removed = self.store.delete_older_than(threshold).await?;
        info!(removed, threshold = %threshold, "Removed stale cache entries");
        Ok(removed)
    }

    /// Zero the statistics counters; the store is untouched
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// The `limit` oldest entries by creation time (admin surface)
    pub async fn list_oldest(&self, limit: usize) -> Result<Vec<CacheEntry>, ApplicationError> {
        self.store.list_oldest(limit).await
    }

    /// Record the hit in store and counters, returning the stored vector
    async fn serve_hit(&self, entry: CacheEntry) -> Result<Vec<f32>, ApplicationError> {
        self.verify_dimensions(&entry)?;
        self.store.touch(&entry.key, Utc::now()).await?;
        self.stats.record_hit(&entry.key.model);
        debug!(key = %entry.key, access_count = entry.access_count + 1, "Cache hit");
        Ok(entry.vector)
    }

    /// Fail loudly when a stored vector disagrees with the provider's
    /// declared dimension for its model
    fn verify_dimensions(&self, entry: &CacheEntry) -> Result<(), ApplicationError> {
        if let Some(expected) = self.provider.dimensions(&entry.key.model) {
            if entry.dimensions() != expected {
                warn!(
                    key = %entry.key,
                    expected,
                    actual = entry.dimensions(),
                    "Stored vector has wrong dimension"
                );
                return Err(DomainError::dimension_mismatch(
                    entry.key.model.as_str(),
                    expected,
                    entry.dimensions(),
                )
                .into());
            }
        }
        Ok(())
    }

    async fn key_lock(&self, key: &CacheKey) -> Arc<Mutex<()>> {
        let mut map = self.inflight.lock().await;
        Arc::clone(
            map.entry(key.clone())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    async fn release_key_lock(&self, key: &CacheKey) {
        let mut map = self.inflight.lock().await;
        // Drop the map entry once no other caller holds the lock.
        if map.get(key).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(key);
        }
    }
}
