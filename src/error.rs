use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Why a category could not be scanned this cycle. Never fatal to the monitor.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected status code: {0}")]
    Status(reqwest::StatusCode),

    #[error("lookup timed out after {0}s")]
    Timeout(u64),

    #[error("no matching lots found")]
    NoMatchingListings,

    #[error("invalid selector {0}")]
    Selector(String),
}

impl LookupError {
    /// Zero matches is an ordinary outcome, not a failure of the upstream page.
    pub fn is_no_match(&self) -> bool {
        matches!(self, LookupError::NoMatchingListings)
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notifier transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("notifier rejected message: {0}")]
    Rejected(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
