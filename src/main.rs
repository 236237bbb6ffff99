mod config;
mod db;
mod engine;
mod error;
mod fetcher;
mod notify;
mod report;
mod types;

use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::db::ObservationStore;
use crate::engine::TrendEngine;
use crate::error::Result;
use crate::notify::TelegramNotifier;

#[tokio::main]
async fn main() {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .init();

    if let Err(e) = run(cfg).await {
        error!("Fatal error: {e}");
        std::process::exit(1);
    }
}

async fn run(cfg: Config) -> Result<()> {
    // --- Database setup ---
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}?mode=rwc", cfg.db_path)).await?;
    let store = ObservationStore::new(pool);
    store.init_schema().await?;
    info!("Database ready at {}", cfg.db_path);

    let client = fetcher::build_client()?;
    let engine = TrendEngine::new(store.clone(), cfg.thresholds.clone());
    let notifier = TelegramNotifier::new(
        client.clone(),
        cfg.telegram_api_url.clone(),
        cfg.telegram_bot_token.clone(),
        cfg.telegram_chat_id.clone(),
    );

    info!(
        "Monitoring {} listing page(s) every {}s",
        cfg.category_urls.len(),
        cfg.check_interval_secs,
    );

    // One full pass per tick, first pass immediate. No overlapping
    // cycles: the next tick waits until this pass returns.
    let mut interval = tokio::time::interval(Duration::from_secs(cfg.check_interval_secs));
    loop {
        interval.tick().await;
        if let Err(e) = run_cycle(&cfg, &client, &store, &engine, &notifier).await {
            // Storage failure abandons the whole cycle; the next tick retries.
            error!("Cycle aborted: {e}");
        }
    }
}

/// One ingest → persist → analyze → report pass.
async fn run_cycle(
    cfg: &Config,
    client: &reqwest::Client,
    store: &ObservationStore,
    engine: &TrendEngine,
    notifier: &TelegramNotifier,
) -> Result<()> {
    let (batch, stats) = fetcher::fetch_batch(client, &cfg.category_urls).await;
    info!(
        "Ingested {} unique products ({} raw) from {} source(s), {} failed",
        stats.unique, stats.discovered, stats.sources_ok, stats.sources_failed,
    );

    for product in &batch {
        store.record(product).await?;
    }

    let trends = engine.analyze().await?;
    info!(
        "Analysis: {} high demand, {} short supply, {} new shortages, {} demand surges, {} top sellers",
        trends.high_demand.len(),
        trends.short_supply.len(),
        trends.increased_shortage.len(),
        trends.increased_demand.len(),
        trends.top_sellers.len(),
    );

    let text = report::format_report(&trends);
    if let Err(e) = notifier.send(&text).await {
        // Committed observations stand; no redelivery of this report.
        error!("Notification failed: {e}");
    }

    Ok(())
}
