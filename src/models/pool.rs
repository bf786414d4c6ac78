use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

/// One upstream record as received. Nothing here is trusted: a field that is
/// absent, `null` or of the wrong JSON type is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawPool {
    pub chain: Option<String>,
    pub project: Option<String>,
    pub symbol: Option<String>,
    pub tvl_usd: Option<f64>,
    pub apy: Option<f64>,
    pub pool: Option<String>,
    pub stablecoin: Option<bool>,
}

impl RawPool {
    pub fn from_value(value: &Value) -> Self {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);

        Self {
            chain: text("chain"),
            project: text("project"),
            symbol: text("symbol"),
            tvl_usd: value.get("tvlUsd").and_then(Value::as_f64),
            apy: value.get("apy").and_then(Value::as_f64),
            pool: text("pool"),
            stablecoin: value.get("stablecoin").and_then(Value::as_bool),
        }
    }
}

/// A pool that passed validation, in upstream field naming.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub symbol: String,
    pub tvl_usd: f64,
    pub apy: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<String>,
    #[serde(default)]
    pub stablecoin: bool,
}

impl PoolRecord {
    /// `None` when a field the pipeline depends on is missing.
    pub fn from_raw(raw: RawPool) -> Option<Self> {
        Some(Self {
            symbol: raw.symbol?,
            tvl_usd: raw.tvl_usd?,
            apy: raw.apy?,
            chain: raw.chain,
            project: raw.project,
            pool: raw.pool,
            stablecoin: raw.stablecoin.unwrap_or(false),
        })
    }
}

/// The ranked payload handed to presentation layers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YieldSnapshot {
    pub data: Vec<PoolRecord>,
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl YieldSnapshot {
    pub fn new(data: Vec<PoolRecord>, timestamp: DateTime<Utc>) -> Self {
        Self { data, timestamp }
    }

    pub fn timestamp_iso(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

pub fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}
