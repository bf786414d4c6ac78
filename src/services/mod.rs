pub mod cache;
pub mod collector;
pub mod filter;
pub mod ranker;
pub mod view;

pub use cache::{CacheStatus, Clock, SnapshotCache, SystemClock};
pub use collector::{CollectorStats, StatsView, YieldCollector};
pub use filter::PoolFilter;
pub use ranker::PoolRanker;
