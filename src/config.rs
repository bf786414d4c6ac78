use serde::Deserialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default)]
    pub background_refresh: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_min_tvl_usd")]
    pub min_tvl_usd: f64,
    #[serde(default)]
    pub min_apy: f64,
    #[serde(default = "default_max_apy")]
    pub max_apy: f64,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_stable_tokens")]
    pub stable_tokens: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub static_dir: Option<String>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

fn default_url() -> String { "https://yields.llama.fi/pools".to_string() }
fn default_timeout_secs() -> u64 { 30 }
fn default_cache_ttl_secs() -> u64 { 300 }
fn default_min_tvl_usd() -> f64 { 100_000.0 }
fn default_max_apy() -> f64 { 500.0 }
fn default_max_results() -> usize { 100 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 3000 }
fn default_page_size() -> usize { 10 }

fn default_stable_tokens() -> Vec<String> {
    ["USD", "DAI", "USDT", "USDC", "FRAX", "LUSD"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            background_refresh: false,
        }
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_tvl_usd: default_min_tvl_usd(),
            min_apy: 0.0,
            max_apy: default_max_apy(),
            max_results: default_max_results(),
            stable_tokens: default_stable_tokens(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            static_dir: None,
            page_size: default_page_size(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads `path` when given; otherwise `config.toml`, falling back to
    /// defaults if that file does not exist.
    pub fn load(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if default_path.exists() {
                    Self::from_file(default_path)
                } else {
                    tracing::warn!("{} not found, using built-in defaults", DEFAULT_CONFIG_PATH);
                    Ok(Self::default())
                }
            }
        }
    }
}
