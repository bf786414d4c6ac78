use crate::config::FilterConfig;
use crate::models::{PoolRecord, RawPool};
use super::PoolFilter;

/// Filter -> sort by TVL desc -> truncate. Pure; bad records are dropped.
#[derive(Clone, Debug)]
pub struct PoolRanker {
    filter: PoolFilter,
    max_results: usize,
}

impl PoolRanker {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            filter: PoolFilter::new(config),
            max_results: config.max_results,
        }
    }

    pub fn filter(&self) -> &PoolFilter {
        &self.filter
    }

    pub fn rank(&self, raw: Vec<RawPool>) -> Vec<PoolRecord> {
        let mut pools: Vec<PoolRecord> = raw
            .into_iter()
            .filter(|p| self.filter.is_valid(p))
            .filter_map(PoolRecord::from_raw)
            .collect();

        // sort_by is stable: equal TVLs keep upstream order
        pools.sort_by(|a, b| b.tvl_usd.total_cmp(&a.tvl_usd));
        pools.truncate(self.max_results);
        pools
    }
}
