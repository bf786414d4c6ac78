use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;
use tokio::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stable_yield::api::{create_rest_router, AppState};
use stable_yield::config::Config;
use stable_yield::services::{PoolRanker, SnapshotCache, SystemClock, YieldCollector};
use stable_yield::sources::{llama::DefiLlamaSource, YieldSource};

#[derive(Parser)]
#[command(name = "stable-yield")]
#[command(about = "Stablecoin yield dashboard backed by DefiLlama")]
struct Cli {
    /// Path to config file (defaults to ./config.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Fetch and rank once, print the table, exit
    #[arg(long)]
    once: bool,
}

/// One-shot mode: print the ranked pools like the dashboard table.
async fn print_once(source: &DefiLlamaSource, ranker: &PoolRanker) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n🔍 Fetching {} ...\n", source.url());

    let start = std::time::Instant::now();
    let raw = source.fetch_pools().await?;
    let raw_count = raw.len();
    let pools = ranker.rank(raw);

    println!("   {:18} {:12} {:24} {:>12} {:>8}", "Protocol", "Chain", "Asset", "TVL", "APY");
    println!("   ────────────────── ──────────── ──────────────────────── ──────────── ────────");
    for pool in &pools {
        println!(
            "   {:18} {:12} {:24} {:>11.2}M {:>7.2}%",
            pool.project.as_deref().unwrap_or("-"),
            pool.chain.as_deref().unwrap_or("-"),
            pool.symbol,
            pool.tvl_usd / 1_000_000.0,
            pool.apy
        );
    }

    println!(
        "\n⏱️  {} of {} pools kept ({:.2}s)",
        pools.len(),
        raw_count,
        start.elapsed().as_secs_f64()
    );
    Ok(())
}

#[tokio::main(worker_threads = 4)]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,stable_yield=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load(cli.config.as_deref())?;
    tracing::info!("✓ Configuration loaded");

    let source = DefiLlamaSource::new(&config.upstream)?;
    let ranker = PoolRanker::new(&config.filter);

    if cli.once {
        return print_once(&source, &ranker).await;
    }

    println!("\n🚀 Stable Yield Dashboard Starting...\n");

    let collector = Arc::new(YieldCollector::new(
        Arc::new(source),
        ranker,
        SnapshotCache::new(config.upstream.cache_ttl_secs),
        Arc::new(SystemClock),
    ));

    // Background: keep the snapshot warm, one forced refresh per cache window
    if config.upstream.background_refresh {
        let collector_clone = collector.clone();
        let period = collector.cache().ttl().to_std()
            .unwrap_or(Duration::from_secs(300))
            .max(Duration::from_secs(1));
        tokio::spawn(async move {
            collector_clone.refresh_loop(period).await;
        });
        tracing::info!("✓ Background refresh every {}s", period.as_secs());
    }

    let state = Arc::new(AppState {
        collector,
        page_size: config.server.page_size,
    });

    let app = create_rest_router(state, config.server.static_dir.as_deref());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    println!("\n✓ Server ready on http://{}\n", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
