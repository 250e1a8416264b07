//! Trade notifications.
//!
//! Notifications are best effort: a failed delivery is logged at `warn` and
//! never affects the cycle that produced it.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Environment variable holding the Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

/// Environment variable holding the destination chat id.
pub const TELEGRAM_CHAT_ENV: &str = "TELEGRAM_CHAT_ID";

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str);
}

/// Writes notifications to the log. Used when Telegram is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, message: &str) {
        tracing::info!(target: "notify", "{message}");
    }
}

/// Sends notifications through the Telegram Bot API.
pub struct TelegramNotifier {
    http: Client,
    api_url: String,
    token: SecretString,
    chat_id: String,
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("api_url", &self.api_url)
            .field("chat_id", &self.chat_id)
            .field("token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

impl TelegramNotifier {
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(
        api_url: impl Into<String>,
        token: SecretString,
        chat_id: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(Duration::from_secs(10)).build()?;
        Ok(Self {
            http,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            token,
            chat_id: chat_id.into(),
        })
    }

    /// Builds a notifier when both Telegram variables are set; `None` otherwise.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn from_env(api_url: &str) -> anyhow::Result<Option<Self>> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        match (read(TELEGRAM_TOKEN_ENV), read(TELEGRAM_CHAT_ENV)) {
            (Some(token), Some(chat_id)) => {
                Self::new(api_url, SecretString::from(token), chat_id).map(Some)
            }
            _ => Ok(None),
        }
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.api_url,
            self.token.expose_secret()
        );
        let response = self
            .http
            .post(&url)
            .json(&serde_json::json!({
                "chat_id": self.chat_id,
                "text": message,
            }))
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("telegram request failed: {}", e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("telegram returned {status}: {body}");
        }
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn notify(&self, message: &str) {
        if let Err(e) = self.send(message).await {
            tracing::warn!(error = %e, "Notification not delivered");
        }
    }
}
