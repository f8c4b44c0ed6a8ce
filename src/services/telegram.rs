//! Telegram Bot API notifier

use crate::config::TelegramConfig;
use crate::error::SignalError;
use crate::models::signal::Signal;
use crate::services::message::MessageFormatter;
use crate::services::notifier::Notifier;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

pub struct TelegramNotifier {
    client: reqwest::Client,
    config: TelegramConfig,
    formatter: MessageFormatter,
}

impl TelegramNotifier {
    /// Build with a client bounded by `config.request_timeout`
    pub fn new(
        config: TelegramConfig,
        formatter: MessageFormatter,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(config, formatter, client))
    }

    pub fn with_client(
        config: TelegramConfig,
        formatter: MessageFormatter,
        client: reqwest::Client,
    ) -> Self {
        Self {
            client,
            config,
            formatter,
        }
    }

    /// POST `sendMessage` and check the API-level `ok` flag
    pub async fn send_text(&self, text: &str) -> Result<(), SignalError> {
        let url = format!(
            "{}/bot{}/sendMessage",
            self.config.base_url.trim_end_matches('/'),
            self.config.bot_token
        );
        let request = SendMessageRequest {
            chat_id: &self.config.chat_id,
            text,
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| SignalError::NotificationFailure(format!("request failed: {}", e)))?;

        let status = response.status();
        let body: ApiResponse = response.json().await.map_err(|e| {
            SignalError::NotificationFailure(format!("unreadable response ({}): {}", status, e))
        })?;

        if !status.is_success() || !body.ok {
            return Err(SignalError::NotificationFailure(format!(
                "Telegram rejected message ({}): {}",
                status,
                body.description.unwrap_or_else(|| "no description".to_string())
            )));
        }

        debug!(chat_id = %self.config.chat_id, "Telegram: message sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn deliver(&self, signal: &Signal) -> Result<(), SignalError> {
        self.send_text(&self.formatter.format(signal)).await?;
        info!(
            symbol = %signal.instrument,
            timeframe = %signal.timeframe,
            direction = %signal.direction,
            "Telegram: signal sent for {} {} {}",
            signal.instrument,
            signal.direction,
            signal.timeframe
        );
        Ok(())
    }

    async fn announce(&self, text: &str) -> Result<(), SignalError> {
        self.send_text(text).await
    }
}
