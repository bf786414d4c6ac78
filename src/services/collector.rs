use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use serde::Serialize;
use tokio::time::interval;
use crate::models::YieldSnapshot;
use crate::sources::{YieldSource, SourceError};
use super::{CacheStatus, Clock, PoolRanker, SnapshotCache};

#[derive(Default)]
pub struct CollectorStats {
    pub upstream_calls: AtomicU64,
    pub upstream_failures: AtomicU64,
    pub cache_hits: AtomicU64,
    pub cache_misses: AtomicU64,
    pub last_raw_count: AtomicU64,
    pub last_pool_count: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub upstream_calls: u64,
    pub upstream_failures: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub last_raw_count: u64,
    pub last_pool_count: u64,
}

impl CollectorStats {
    pub fn view(&self) -> StatsView {
        StatsView {
            upstream_calls: self.upstream_calls.load(Ordering::Relaxed),
            upstream_failures: self.upstream_failures.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            last_raw_count: self.last_raw_count.load(Ordering::Relaxed),
            last_pool_count: self.last_pool_count.load(Ordering::Relaxed),
        }
    }
}

/// Fetch -> rank -> cache. The one retrieval operation the API exposes.
pub struct YieldCollector {
    source: Arc<dyn YieldSource>,
    ranker: PoolRanker,
    cache: SnapshotCache,
    clock: Arc<dyn Clock>,
    stats: CollectorStats,
}

impl YieldCollector {
    pub fn new(
        source: Arc<dyn YieldSource>,
        ranker: PoolRanker,
        cache: SnapshotCache,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            source,
            ranker,
            cache,
            clock,
            stats: CollectorStats::default(),
        }
    }

    pub fn stats(&self) -> &CollectorStats {
        &self.stats
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub async fn retrieve(&self) -> Result<(Arc<YieldSnapshot>, CacheStatus), SourceError> {
        let now = self.clock.now();
        let result = self.cache.get_or_refresh(now, || self.fetch_and_rank()).await;

        if let Ok((_, status)) = &result {
            let counter = match status {
                CacheStatus::Hit => &self.stats.cache_hits,
                CacheStatus::Miss => &self.stats.cache_misses,
            };
            counter.fetch_add(1, Ordering::Relaxed);
        }

        result
    }

    /// Fetches even if the cached snapshot is still fresh.
    pub async fn refresh(&self) -> Result<Arc<YieldSnapshot>, SourceError> {
        self.cache.refresh(|| self.fetch_and_rank()).await
    }

    /// Background warmer: one forced refresh per `period`, starting now.
    pub async fn refresh_loop(&self, period: std::time::Duration) {
        let mut ticker = interval(period);
        loop {
            ticker.tick().await;
            if let Err(e) = self.refresh().await {
                tracing::warn!("Background refresh failed: {}", e);
            }
        }
    }

    async fn fetch_and_rank(&self) -> Result<YieldSnapshot, SourceError> {
        let start = Instant::now();
        self.stats.upstream_calls.fetch_add(1, Ordering::Relaxed);

        let raw = match self.source.fetch_pools().await {
            Ok(raw) => raw,
            Err(e) => {
                self.stats.upstream_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!("Source {} error: {}", self.source.name(), e);
                return Err(e);
            }
        };

        let raw_count = raw.len();
        let pools = self.ranker.rank(raw);

        self.stats.last_raw_count.store(raw_count as u64, Ordering::Relaxed);
        self.stats.last_pool_count.store(pools.len() as u64, Ordering::Relaxed);

        tracing::info!(
            "✓ {} pools fetched, {} kept ({:.2}s)",
            raw_count,
            pools.len(),
            start.elapsed().as_secs_f64()
        );

        // stamped after the fetch so the window starts when the data arrived
        Ok(YieldSnapshot::new(pools, self.clock.now()))
    }
}
