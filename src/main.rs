mod api;
mod config;
mod db;
mod error;
mod fetcher;
mod matcher;
mod monitor;
mod notifier;
mod parser;
mod provider;
mod types;

#[cfg(test)]
mod test_support;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use crate::api::health::HealthState;
use crate::api::latency::LatencyStats;
use crate::api::routes::{router, ApiState};
use crate::config::{Config, CHANNEL_CAPACITY};
use crate::db::{HistoryWriter, SqliteSubscriptionRepository, SubscriptionRepository};
use crate::error::Result;
use crate::fetcher::PageFetcher;
use crate::monitor::{MonitorService, MonitorSettings};
use crate::notifier::TelegramNotifier;
use crate::provider::MarketplaceClient;

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
    let pool = db::connect(&cfg.db_path).await?;
    info!("Database ready at {}", cfg.db_path);

    let repo: Arc<dyn SubscriptionRepository> =
        Arc::new(SqliteSubscriptionRepository::new(pool.clone()));

    // --- Collaborators ---
    let fetcher = PageFetcher::new(&cfg.user_agent, Duration::from_secs(cfg.fetch_timeout_secs))?;
    let lots = Arc::new(MarketplaceClient::new(fetcher, cfg.market_base_url.clone()));
    let notifier = Arc::new(TelegramNotifier::new(&cfg.telegram_api_url, &cfg.telegram_bot_token)?);
    info!(
        base_url = %cfg.market_base_url,
        fetch_timeout_secs = cfg.fetch_timeout_secs,
        "Watching marketplace at {}",
        cfg.market_base_url,
    );

    // --- Price history writer ---
    let (history_tx, history_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let writer = HistoryWriter::new(pool.clone(), history_rx);
    tokio::spawn(async move { writer.run().await });

    // --- Monitor (fixed-delay scan cycles) ---
    let health = Arc::new(HealthState::new());
    let latency = Arc::new(LatencyStats::new());
    let monitor = Arc::new(
        MonitorService::new(repo.clone(), lots, notifier, MonitorSettings::from_config(&cfg))
            .with_history(history_tx)
            .with_metrics(Arc::clone(&health), Arc::clone(&latency)),
    );
    tokio::spawn(Arc::clone(&monitor).run());

    // --- HTTP API server ---
    let api_state = ApiState {
        pool,
        repo,
        monitor,
        health,
        latency,
    };
    let app = router(api_state);
    let bind_addr = format!("0.0.0.0:{}", cfg.api_port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("HTTP API listening on {bind_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
