use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::{Duration, Instant};
use crate::config::UpstreamConfig;
use crate::models::RawPool;
use super::{YieldSource, SourceError};

/// DefiLlama yields feed (`GET /pools`).
pub struct DefiLlamaSource {
    client: Client,
    url: String,
}

// Elements stay untyped so one bad record cannot reject the whole body.
#[derive(Debug, Deserialize)]
struct LlamaResponse {
    data: Vec<Value>,
}

impl DefiLlamaSource {
    pub fn new(config: &UpstreamConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl YieldSource for DefiLlamaSource {
    fn name(&self) -> &'static str {
        "DefiLlama"
    }

    async fn fetch_pools(&self) -> Result<Vec<RawPool>, SourceError> {
        let start = Instant::now();

        let resp = self.client.get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SourceError::Unavailable(format!("HTTP {}", status)));
        }

        // Reading the body can still time out; that is a transport problem.
        let body = resp.bytes()
            .await
            .map_err(|e| SourceError::Unavailable(e.to_string()))?;

        let parsed: LlamaResponse = serde_json::from_slice(&body)
            .map_err(|e| SourceError::Malformed(e.to_string()))?;

        let pools: Vec<RawPool> = parsed.data.iter().map(RawPool::from_value).collect();

        tracing::debug!(
            "📡 {} returned {} pools ({} bytes, {:.2}s)",
            self.name(),
            pools.len(),
            body.len(),
            start.elapsed().as_secs_f64()
        );

        Ok(pools)
    }
}
