use crate::error::{AppError, Result};

pub const MARKET_BASE_URL: &str = "https://funpay.com";
pub const TELEGRAM_API_URL: &str = "https://api.telegram.org";

/// Desktop Chrome identity. The marketplace rejects default client user agents.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Per-request timeout for listing page fetches (seconds).
pub const FETCH_TIMEOUT_SECS: u64 = 15;

/// Fixed delay between the end of one scan cycle and the start of the next (seconds).
pub const SCAN_INTERVAL_SECS: u64 = 60;

/// Deadline for one subscription's lookup (fetch + extract). Expiry counts as a fetch error.
pub const SUBSCRIPTION_TIMEOUT_SECS: u64 = 25;

/// Subscriptions processed concurrently within one cycle.
pub const SCAN_CONCURRENCY: usize = 4;

/// Channel capacity for price observations queued for the history writer.
pub const CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct Config {
    pub log_level: String,
    pub db_path: String,
    pub api_port: u16,
    /// Marketplace origin; category pages live at `<base>/lots/<category>/` (MARKET_BASE_URL)
    pub market_base_url: String,
    pub user_agent: String,
    pub fetch_timeout_secs: u64,
    pub scan_interval_secs: u64,
    pub subscription_timeout_secs: u64,
    /// Bounded worker count per cycle, never below 1 (SCAN_CONCURRENCY)
    pub scan_concurrency: usize,
    pub telegram_bot_token: String,
    pub telegram_api_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            db_path: std::env::var("DB_PATH").unwrap_or_else(|_| "lot-watch.db".to_string()),
            api_port: std::env::var("API_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse::<u16>()
                .map_err(|_| AppError::Config("API_PORT must be a valid port number".to_string()))?,
            market_base_url: std::env::var("MARKET_BASE_URL")
                .unwrap_or_else(|_| MARKET_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            user_agent: std::env::var("USER_AGENT")
                .unwrap_or_else(|_| BROWSER_USER_AGENT.to_string()),
            fetch_timeout_secs: std::env::var("FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| FETCH_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(FETCH_TIMEOUT_SECS),
            scan_interval_secs: std::env::var("SCAN_INTERVAL_SECS")
                .unwrap_or_else(|_| SCAN_INTERVAL_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(SCAN_INTERVAL_SECS),
            subscription_timeout_secs: std::env::var("SUBSCRIPTION_TIMEOUT_SECS")
                .unwrap_or_else(|_| SUBSCRIPTION_TIMEOUT_SECS.to_string())
                .parse::<u64>()
                .unwrap_or(SUBSCRIPTION_TIMEOUT_SECS),
            scan_concurrency: std::env::var("SCAN_CONCURRENCY")
                .unwrap_or_else(|_| SCAN_CONCURRENCY.to_string())
                .parse::<usize>()
                .unwrap_or(SCAN_CONCURRENCY)
                .max(1),
            telegram_bot_token: std::env::var("TELEGRAM_BOT_TOKEN")
                .ok()
                .filter(|t| !t.trim().is_empty())
                .ok_or_else(|| AppError::Config("TELEGRAM_BOT_TOKEN is not set".to_string()))?,
            telegram_api_url: std::env::var("TELEGRAM_API_URL")
                .unwrap_or_else(|_| TELEGRAM_API_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        })
    }
}
