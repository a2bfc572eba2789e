//! Telegram Bot API notification channel.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::ChannelError;
use crate::events::NotifyEvent;
use crate::NotifyChannel;

/// Environment variable for the Telegram bot token.
const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_TOKEN";

/// Environment variable for the Telegram chat id.
const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Environment variable for the retry count (default 3).
const ENV_TELEGRAM_RETRY_COUNT: &str = "TELEGRAM_RETRY_COUNT";

/// Default Telegram Bot API base URL.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram Bot API notification channel.
pub struct TelegramChannel {
    token: Option<String>,
    chat_id: Option<String>,
    retry_count: u32,
    base_url: String,
    client: reqwest::Client,
}

impl TelegramChannel {
    /// Create a new Telegram channel from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let token = std::env::var(ENV_TELEGRAM_TOKEN)
            .ok()
            .filter(|s| !s.is_empty());
        let chat_id = std::env::var(ENV_TELEGRAM_CHAT_ID)
            .ok()
            .filter(|s| !s.is_empty());
        let retry_count = std::env::var(ENV_TELEGRAM_RETRY_COUNT)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3);

        if token.is_some() && chat_id.is_some() {
            debug!("Telegram notifications enabled");
        } else {
            debug!("Telegram notifications disabled (TELEGRAM_TOKEN/TELEGRAM_CHAT_ID not set)");
        }

        Self {
            token,
            chat_id,
            retry_count,
            base_url: TELEGRAM_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Create a Telegram channel with explicit credentials.
    #[must_use]
    pub fn new(token: String, chat_id: String) -> Self {
        Self {
            token: Some(token),
            chat_id: Some(chat_id),
            retry_count: 3,
            base_url: TELEGRAM_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Set a custom API base URL (used in tests).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Format an event as a Telegram Markdown message.
    fn format_message(event: &NotifyEvent) -> String {
        match event {
            NotifyEvent::AlertProcessed {
                alert_name,
                severity,
                description,
                analysis,
                action_summary,
                elapsed_secs,
                ..
            } => format!(
                "🚨 *AI DevOps Monitor*\n\n\
                 *Alert*: {alert_name}\n\
                 *Severity*: {}\n\
                 *Description*: {description}\n\n\
                 🧠 *AI Analysis*: {analysis}\n\n\
                 {action_summary}\n\n\
                 _Processed in {elapsed_secs:.2}s_",
                severity.as_str()
            ),
            NotifyEvent::AgentError { message, .. } => {
                format!("⚠️ *Remediation agent error*: {message}")
            }
        }
    }

    /// Send one message, without retry.
    async fn send_once(&self, token: &str, chat_id: &str, text: &str) -> Result<(), ChannelError> {
        let url = format!("{}/bot{token}/sendMessage", self.base_url);
        let payload = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .timeout(Duration::from_secs(10))
            .send()
            .await?;

        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ChannelError::Other(format!(
                "Telegram returned {status}: {body}"
            )))
        }
    }
}

#[async_trait]
impl NotifyChannel for TelegramChannel {
    fn name(&self) -> &'static str {
        "telegram"
    }

    fn enabled(&self) -> bool {
        self.token.is_some() && self.chat_id.is_some()
    }

    async fn send(&self, event: &NotifyEvent) -> Result<(), ChannelError> {
        let token = self
            .token
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_TELEGRAM_TOKEN.to_string()))?;
        let chat_id = self
            .chat_id
            .as_ref()
            .ok_or_else(|| ChannelError::NotConfigured(ENV_TELEGRAM_CHAT_ID.to_string()))?;

        let text = Self::format_message(event);
        let attempts = self.retry_count.max(1);
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match self.send_once(token, chat_id, &text).await {
                Ok(()) => {
                    debug!(channel = "telegram", len = text.len(), "Notification sent");
                    return Ok(());
                }
                Err(e) => {
                    warn!(
                        channel = "telegram",
                        attempt,
                        error = %e,
                        "Telegram send failed"
                    );
                    last_error = e.to_string();
                }
            }

            if attempt < attempts {
                tokio::time::sleep(Duration::from_secs(2u64.pow(attempt))).await;
            }
        }

        Err(ChannelError::RetriesExhausted {
            attempts,
            last_error,
        })
    }
}

/// Telegram `sendMessage` request body.
#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
    disable_web_page_preview: bool,
}
