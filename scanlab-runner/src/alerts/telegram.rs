//! Telegram bot sink.
//!
//! Plain alerts go through `sendMessage`. Alerts with a chart are sent as a
//! document with the alert text as its caption, so text and chart arrive as
//! one message.

use reqwest::blocking::{multipart, Client};
use scanlab_core::alert::{Alert, AlertError, AlertSink};
use serde_json::json;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_API_URL: &str = "https://api.telegram.org";

pub struct TelegramSink {
    client: Client,
    api_url: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self, AlertError> {
        let bot_token = bot_token.into();
        let chat_id = chat_id.into();
        if bot_token.trim().is_empty() || chat_id.trim().is_empty() {
            return Err(AlertError::NotConfigured(
                "telegram bot token and chat id are required".into(),
            ));
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| AlertError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            api_url: DEFAULT_API_URL.to_string(),
            bot_token,
            chat_id,
        })
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_url.trim_end_matches('/'),
            self.bot_token
        )
    }

    fn check(resp: reqwest::blocking::Response) -> Result<(), AlertError> {
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }
        let body = resp
            .text()
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        Err(AlertError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    fn send_message(&self, text: &str) -> Result<(), AlertError> {
        let payload = json!({
            "chat_id": self.chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        let resp = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&payload)
            .send()
            .map_err(|e| AlertError::Transport(e.to_string()))?;
        Self::check(resp)
    }

    fn send_document(&self, text: &str, path: &std::path::Path) -> Result<(), AlertError> {
        let form = multipart::Form::new()
            .text("chat_id", self.chat_id.clone())
            .text("caption", text.to_string())
            .file("document", path)?;
        let resp = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .map_err(|e| AlertError::Transport(e.to_string()))?;
        Self::check(resp)
    }
}

impl AlertSink for TelegramSink {
    fn name(&self) -> &str {
        "telegram"
    }

    fn deliver(&self, alert: Alert) -> Result<(), AlertError> {
        let text = alert.message();
        match &alert.chart {
            Some(chart) => self.send_document(&text, chart.path())?,
            None => self.send_message(&text)?,
        }
        info!(
            symbol = %alert.symbol,
            direction = %alert.direction,
            with_chart = alert.chart.is_some(),
            "telegram alert sent"
        );
        Ok(())
    }
}
