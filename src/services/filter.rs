use crate::models::RawPool;
use crate::config::FilterConfig;

#[derive(Clone, Debug)]
pub struct PoolFilter {
    min_tvl_usd: f64,
    min_apy: f64,
    max_apy: f64,
    stable_tokens: Vec<String>,
}

impl PoolFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            min_tvl_usd: config.min_tvl_usd,
            min_apy: config.min_apy,
            max_apy: config.max_apy,
            stable_tokens: config.stable_tokens.clone(),
        }
    }

    /// Provider flag, or a case-sensitive substring hit on the symbol.
    /// The flag under-reports, so the symbol check recovers the rest.
    pub fn is_stable(&self, pool: &RawPool) -> bool {
        if pool.stablecoin == Some(true) {
            return true;
        }

        match pool.symbol.as_deref() {
            Some(symbol) => self.stable_tokens.iter().any(|t| symbol.contains(t.as_str())),
            None => false,
        }
    }

    /// Dust pools (<= min TVL) are dropped.
    pub fn has_liquidity(&self, pool: &RawPool) -> bool {
        matches!(pool.tvl_usd, Some(tvl) if tvl > self.min_tvl_usd)
    }

    /// Zero or absurd APYs are inactive pools or data glitches.
    pub fn has_plausible_apy(&self, pool: &RawPool) -> bool {
        matches!(pool.apy, Some(apy) if apy > self.min_apy && apy < self.max_apy)
    }

    /// A symbol is needed to publish the record even when the flag alone
    /// makes it stable.
    pub fn is_valid(&self, pool: &RawPool) -> bool {
        let valid = pool.symbol.is_some()
            && self.is_stable(pool)
            && self.has_liquidity(pool)
            && self.has_plausible_apy(pool);
        if !valid {
            tracing::trace!(
                "    ✗ excluded: {:?} @ {:?} (tvl={:?}, apy={:?})",
                pool.symbol, pool.project, pool.tvl_usd, pool.apy
            );
        }
        valid
    }
}
