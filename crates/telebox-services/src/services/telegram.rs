//! Telegram Bot API client
//!
//! Only `sendDocument` is used: images are sent as documents so Telegram
//! keeps the original bytes instead of recompressing them.

use super::messenger::{Messenger, MessengerError, OutgoingDocument};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use telebox_core::Config;

/// Envelope of every Bot API response.
#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    http_client: reqwest::Client,
    api_url: String,
    bot_token: String,
}

impl fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramClient")
            .field("api_url", &self.api_url)
            .field("bot_token", &"[REDACTED]")
            .finish()
    }
}

impl TelegramClient {
    pub fn new(api_url: impl Into<String>, bot_token: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Telegram")?;

        Ok(Self {
            http_client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.telegram_api_url.clone(),
            config.telegram_bot_token.clone(),
            Duration::from_secs(config.telegram_timeout_secs),
        )
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_url, self.bot_token, method)
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    #[tracing::instrument(skip(self, document, caption), fields(filename = %document.filename))]
    async fn send_document(
        &self,
        chat_id: &str,
        document: OutgoingDocument<'_>,
        caption: Option<&str>,
    ) -> Result<(), MessengerError> {
        let data = tokio::fs::read(document.path)
            .await
            .map_err(|source| {
                tracing::warn!(path = %document.path.display(), error = %source, "Failed to read staged file");
                MessengerError::Io(source)
            })?;

        let part = Part::bytes(data)
            .file_name(document.filename.to_string())
            .mime_str(document.content_type)?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);

        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = self
            .http_client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        // Telegram answers errors with a JSON envelope and a 4xx status, so the
        // body is inspected before the status code.
        match serde_json::from_str::<TelegramResponse>(&body) {
            Ok(TelegramResponse { ok: true, .. }) => {
                tracing::debug!("Telegram accepted document");
                Ok(())
            }
            Ok(TelegramResponse { description, .. }) => Err(MessengerError::Rejected(
                description.unwrap_or_else(|| format!("Telegram returned HTTP {}", status)),
            )),
            Err(_) => Err(MessengerError::Rejected(format!(
                "Telegram returned HTTP {}",
                status
            ))),
        }
    }
}
