use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AppError, NotifyError, Result};
use crate::notifier::Notifier;

/// Sends messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramNotifier {
    client: reqwest::Client,
    endpoint: String,
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: i64,
    text: &'a str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(api_url: &str, token: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(AppError::Http)?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{}/sendMessage", api_url.trim_end_matches('/'), token),
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, user_id: i64, message: &str) -> std::result::Result<(), NotifyError> {
        let body = SendMessage {
            chat_id: user_id,
            text: message,
            disable_web_page_preview: false,
        };
        let resp = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = resp.status();
        // The Bot API reports failures as JSON with `ok: false`, usually alongside a 4xx.
        let parsed: Option<ApiResponse> = resp.json().await.ok();

        match parsed {
            Some(ApiResponse { ok: true, .. }) if status.is_success() => {
                debug!(user_id, "Telegram message delivered");
                Ok(())
            }
            Some(ApiResponse { description, .. }) => Err(NotifyError::Rejected(
                description.unwrap_or_else(|| format!("status {status}")),
            )),
            None => Err(NotifyError::Rejected(format!("status {status}, unreadable body"))),
        }
    }
}
