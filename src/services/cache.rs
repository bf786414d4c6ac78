use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;
use crate::models::YieldSnapshot;
use crate::sources::SourceError;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheStatus::Hit => "HIT",
            CacheStatus::Miss => "MISS",
        }
    }
}

/// Single-slot snapshot cache with a fixed freshness window.
///
/// Readers clone the `Arc` under a short read lock; a refresh swaps in a
/// fully built snapshot, so nobody observes a half-written one. Refreshes are
/// serialized so concurrent misses cost one upstream call.
pub struct SnapshotCache {
    slot: RwLock<Option<Arc<YieldSnapshot>>>,
    refresh_lock: Mutex<()>,
    ttl: Duration,
}

// chrono's TimeDelta tops out at i64::MAX milliseconds.
const MAX_TTL_SECS: u64 = (i64::MAX / 1_000) as u64;

impl SnapshotCache {
    pub fn new(ttl_seconds: u64) -> Self {
        if ttl_seconds > MAX_TTL_SECS {
            tracing::warn!("cache ttl {}s out of range, clamped to {}s", ttl_seconds, MAX_TTL_SECS);
        }

        Self {
            slot: RwLock::new(None),
            refresh_lock: Mutex::new(()),
            ttl: Duration::seconds(ttl_seconds.min(MAX_TTL_SECS) as i64),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot regardless of age.
    pub fn peek(&self) -> Option<Arc<YieldSnapshot>> {
        self.slot.read().clone()
    }

    /// Snapshot still inside the window at `now`.
    pub fn get_fresh(&self, now: DateTime<Utc>) -> Option<Arc<YieldSnapshot>> {
        let slot = self.slot.read();
        slot.as_ref()
            .filter(|s| now - s.timestamp < self.ttl)
            .cloned()
    }

    pub fn store(&self, snapshot: YieldSnapshot) -> Arc<YieldSnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.slot.write() = Some(snapshot.clone());
        snapshot
    }

    /// Returns the cached snapshot if fresh at `now`, otherwise runs `refresh`
    /// and stores the snapshot it builds. `refresh` stamps its own timestamp so
    /// the window starts when the data arrived. Failures leave the slot as is.
    pub async fn get_or_refresh<F, Fut>(
        &self,
        now: DateTime<Utc>,
        refresh: F,
    ) -> Result<(Arc<YieldSnapshot>, CacheStatus), SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<YieldSnapshot, SourceError>>,
    {
        if let Some(snapshot) = self.get_fresh(now) {
            return Ok((snapshot, CacheStatus::Hit));
        }

        let _guard = self.refresh_lock.lock().await;

        // Someone else may have refreshed while we waited.
        if let Some(snapshot) = self.get_fresh(now) {
            return Ok((snapshot, CacheStatus::Hit));
        }

        let snapshot = self.store(refresh().await?);
        tracing::debug!("🔄 Snapshot refreshed: {} pools", snapshot.data.len());
        Ok((snapshot, CacheStatus::Miss))
    }

    /// Unconditional refresh for the background task. Shares the refresh lock
    /// with `get_or_refresh`, so it never races a request-driven refresh.
    pub async fn refresh<F, Fut>(&self, refresh: F) -> Result<Arc<YieldSnapshot>, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<YieldSnapshot, SourceError>>,
    {
        let _guard = self.refresh_lock.lock().await;
        let snapshot = self.store(refresh().await?);
        tracing::debug!("🔄 Snapshot refreshed (forced): {} pools", snapshot.data.len());
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PoolRecord;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn record(symbol: &str) -> PoolRecord {
        PoolRecord {
            chain: None,
            project: None,
            symbol: symbol.into(),
            tvl_usd: 1_000_000.0,
            apy: 5.0,
            pool: None,
            stablecoin: true,
        }
    }

    fn snap(symbol: &str, ts: DateTime<Utc>) -> YieldSnapshot {
        YieldSnapshot::new(vec![record(symbol)], ts)
    }

    #[tokio::test]
    async fn hit_within_window_keeps_timestamp() {
        let cache = SnapshotCache::new(300);
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let (first, status) = cache
            .get_or_refresh(t0(), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(snap("USDC", t0()))
            })
            .await
            .unwrap();
        assert_eq!(status, CacheStatus::Miss);

        let (second, status) = cache
            .get_or_refresh(t0() + Duration::seconds(299), || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(snap("DAI", t0()))
            })
            .await
            .unwrap();

        assert_eq!(status, CacheStatus::Hit);
        assert_eq!(second.timestamp, first.timestamp);
        assert_eq!(second.data[0].symbol, "USDC");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn expired_window_refetches() {
        let cache = SnapshotCache::new(300);

        cache.get_or_refresh(t0(), || async { Ok(snap("USDC", t0())) }).await.unwrap();

        let later = t0() + Duration::seconds(300);
        let (snapshot, status) = cache
            .get_or_refresh(later, || async move { Ok(snap("DAI", later)) })
            .await
            .unwrap();

        assert_eq!(status, CacheStatus::Miss);
        assert_eq!(snapshot.timestamp, later);
        assert_eq!(snapshot.data[0].symbol, "DAI");
    }

    #[tokio::test]
    async fn failure_is_not_cached_and_keeps_old_snapshot() {
        let cache = SnapshotCache::new(10);
        cache.get_or_refresh(t0(), || async { Ok(snap("USDC", t0())) }).await.unwrap();

        let later = t0() + Duration::seconds(60);
        let err = cache
            .get_or_refresh(later, || async { Err(SourceError::Unavailable("timeout".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));

        let stale = cache.peek().unwrap();
        assert_eq!(stale.timestamp, t0());
        assert!(cache.get_fresh(later).is_none());

        let (_, status) = cache
            .get_or_refresh(later, || async move { Ok(YieldSnapshot::new(vec![], later)) })
            .await
            .unwrap();
        assert_eq!(status, CacheStatus::Miss);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_misses_share_one_refresh() {
        let cache = Arc::new(SnapshotCache::new(300));
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_refresh(t0(), || async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                        Ok(snap("USDC", t0()))
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut misses = 0;
        for handle in handles {
            let (snapshot, status) = handle.await.unwrap();
            assert_eq!(snapshot.timestamp, t0());
            if status == CacheStatus::Miss {
                misses += 1;
            }
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(misses, 1);
    }

    #[tokio::test]
    async fn window_starts_at_the_refresh_stamp() {
        let cache = SnapshotCache::new(300);

        // a slow fetch: asked at t0, data stamped 30s later
        let arrived = t0() + Duration::seconds(30);
        cache.get_or_refresh(t0(), || async move { Ok(snap("USDC", arrived)) }).await.unwrap();

        assert!(cache.get_fresh(t0() + Duration::seconds(320)).is_some());
        assert!(cache.get_fresh(arrived + Duration::seconds(300)).is_none());
    }

    #[tokio::test]
    async fn forced_refresh_replaces_a_fresh_snapshot() {
        let cache = SnapshotCache::new(300);
        cache.get_or_refresh(t0(), || async { Ok(snap("USDC", t0())) }).await.unwrap();

        let later = t0() + Duration::seconds(10);
        let snapshot = cache.refresh(|| async move { Ok(snap("DAI", later)) }).await.unwrap();
        assert_eq!(snapshot.data[0].symbol, "DAI");
        assert_eq!(cache.peek().unwrap().timestamp, later);

        let err = cache
            .refresh(|| async { Err(SourceError::Unavailable("down".into())) })
            .await
            .unwrap_err();
        assert!(matches!(err, SourceError::Unavailable(_)));
        assert_eq!(cache.peek().unwrap().data[0].symbol, "DAI");
    }

    #[tokio::test]
    async fn huge_ttl_is_clamped_instead_of_panicking() {
        let cache = SnapshotCache::new(u64::MAX);
        assert!(cache.ttl() > Duration::days(365 * 1_000));

        cache.get_or_refresh(t0(), || async { Ok(snap("USDC", t0())) }).await.unwrap();
        let (_, status) = cache
            .get_or_refresh(t0() + Duration::days(365), || async { Ok(snap("DAI", t0())) })
            .await
            .unwrap();
        assert_eq!(status, CacheStatus::Hit);
    }
}
