//! Telegram Bot API transport (`sendMessage`, HTML parse mode).

use std::time::Duration;

use super::transport::{DeliveryOutcome, Notifier};
use crate::data::DataError;

pub const DEFAULT_API_BASE: &str = "https://api.telegram.org";

pub struct TelegramNotifier {
    client: reqwest::blocking::Client,
    bot_token: String,
    api_base: String,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, timeout: Duration) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            bot_token: bot_token.into(),
            api_base: DEFAULT_API_BASE.to_string(),
        })
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    fn send_url(&self) -> String {
        format!("{}/bot{}/sendMessage", self.api_base, self.bot_token)
    }
}

impl Notifier for TelegramNotifier {
    fn name(&self) -> &str {
        "telegram"
    }

    fn deliver(&self, text: &str, chat_id: &str) -> DeliveryOutcome {
        if self.bot_token.is_empty() || chat_id.is_empty() {
            return DeliveryOutcome::failed("No bot token/chat id");
        }

        let form = [("chat_id", chat_id), ("text", text), ("parse_mode", "HTML")];
        let resp = match self.client.post(self.send_url()).form(&form).send() {
            Ok(resp) => resp,
            Err(e) => {
                // reqwest errors can embed the URL, which carries the token
                let detail = e.without_url().to_string();
                tracing::warn!(error = %detail, "telegram delivery failed");
                return DeliveryOutcome::failed(detail);
            }
        };

        let status = resp.status();
        let body = resp.text().unwrap_or_default();
        if status == reqwest::StatusCode::OK {
            DeliveryOutcome::sent(body)
        } else {
            tracing::warn!(%status, "telegram rejected message");
            DeliveryOutcome::failed(format!("{}: {body}", status.as_u16()))
        }
    }
}
