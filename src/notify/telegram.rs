//! Telegram Bot API notifier.
//!
//! Sends plain-text messages through `sendMessage`. The bot token is
//! verified with `getMe` when the notifier is built, so a bad token stops
//! the process before the agent loop starts.
//!
//! API docs: https://core.telegram.org/bots/api

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::Notifier;
use crate::types::DeliveryError;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: i64,
    text: &'a str,
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct TelegramResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    username: Option<String>,
}

/// Telegram delivery via the Bot API.
pub struct TelegramNotifier {
    http: Client,
    api_url: String,
    token: SecretString,
}

impl TelegramNotifier {
    /// Build the notifier and check the token against `getMe`.
    pub async fn connect(token: SecretString, api_url: &str) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client for Telegram")?;

        let notifier = Self {
            http,
            api_url: api_url.trim_end_matches('/').to_string(),
            token,
        };

        let me: TelegramResponse<BotUser> = notifier
            .http
            .get(notifier.method_url("getMe"))
            .send()
            .await
            .map_err(|e| anyhow!("Telegram getMe request failed: {}", e.without_url()))?
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse Telegram getMe response: {}", e.without_url()))?;

        if !me.ok {
            anyhow::bail!(
                "Telegram rejected the bot token: {}",
                me.description.unwrap_or_default()
            );
        }

        let username = me.result.and_then(|u| u.username).unwrap_or_default();
        info!(bot = %username, "Authorized on Telegram");

        Ok(notifier)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{method}", self.api_url, self.token.expose_secret())
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, chat_id: i64, text: &str) -> Result<(), DeliveryError> {
        let resp = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&SendMessageRequest { chat_id, text })
            .send()
            .await
            // reqwest errors carry the URL, and with it the token.
            .map_err(|e| DeliveryError(e.without_url().to_string()))?;

        let status = resp.status();
        let reply: TelegramResponse<serde_json::Value> = resp
            .json()
            .await
            .map_err(|e| DeliveryError(format!("HTTP {status}: {}", e.without_url())))?;

        if !reply.ok {
            return Err(DeliveryError(
                reply
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            ));
        }

        debug!(chat_id, "Telegram message sent");
        Ok(())
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
