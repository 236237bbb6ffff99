use serde_json::json;

use crate::error::{AppError, Result};

/// Delivers a formatted report through the Telegram Bot API.
/// Failures surface as `AppError::Notify`; the caller logs and moves on —
/// observations are already committed and there is no redelivery.
pub struct TelegramNotifier {
    client: reqwest::Client,
    api_url: String,
    token: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(client: reqwest::Client, api_url: String, token: String, chat_id: String) -> Self {
        Self {
            client,
            api_url,
            token,
            chat_id,
        }
    }

    pub async fn send(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.api_url, self.token);
        let resp = self
            .client
            .post(&url)
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "HTML",
                "disable_web_page_preview": true,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Notify(format!(
                "Telegram send failed: {status} {body}"
            )));
        }
        Ok(())
    }
}
