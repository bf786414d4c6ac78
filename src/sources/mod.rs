pub mod llama;

use async_trait::async_trait;
use thiserror::Error;
use crate::models::RawPool;

/// Upstream feed of raw pool records.
#[async_trait]
pub trait YieldSource: Send + Sync {
    fn name(&self) -> &'static str;
    async fn fetch_pools(&self) -> Result<Vec<RawPool>, SourceError>;
}

#[derive(Debug, Clone, Error)]
pub enum SourceError {
    /// Transport failure, timeout or non-2xx status.
    #[error("Upstream unavailable: {0}")]
    Unavailable(String),
    /// Body does not have the `{ data: [...] }` shape.
    #[error("Upstream malformed: {0}")]
    Malformed(String),
}
