// src/core/transport/telegram/api.rs

//! Raw HTTP calls to the Telegram Bot API.

use super::types::{ApiResponse, BotUser, Update};
use crate::core::RelayError;
use crate::core::protocol::{Activity, FormatHint};
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

/// Slack added on top of the long-poll timeout before the HTTP client gives up.
const HTTP_TIMEOUT_MARGIN: Duration = Duration::from_secs(15);

/// Low-level Telegram Bot API client.
pub struct TelegramApi {
    client: Client,
    base_url: String,
}

impl TelegramApi {
    /// Creates a client for `bot_token` against `base_url` (the public API or a test server).
    pub fn new(bot_token: &str, base_url: &str, poll_timeout_secs: u64) -> Result<Self, RelayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs) + HTTP_TIMEOUT_MARGIN)
            .build()?;
        Ok(Self {
            client,
            base_url: format!("{}/bot{}", base_url.trim_end_matches('/'), bot_token),
        })
    }

    /// Returns the bot's own account; used to verify the credential at startup.
    pub async fn get_me(&self) -> Result<BotUser, RelayError> {
        let resp = self
            .client
            .post(format!("{}/getMe", self.base_url))
            .send()
            .await?;
        Self::unwrap_response("getMe", resp.json().await?)
    }

    /// Sends a text message to a chat.
    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        format: FormatHint,
    ) -> Result<(), RelayError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "disable_web_page_preview": true,
        });
        if format == FormatHint::MarkdownV2 {
            body["parse_mode"] = json!("MarkdownV2");
        }

        debug!("sendMessage to chat_id={chat_id}");
        let resp = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&body)
            .send()
            .await?;
        Self::unwrap_response::<serde_json::Value>("sendMessage", resp.json().await?)?;
        Ok(())
    }

    /// Uploads a local file as a document.
    pub async fn send_document(
        &self,
        chat_id: &str,
        path: &Path,
        caption: &str,
    ) -> Result<(), RelayError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output.txt".to_string());
        let part = Part::bytes(bytes)
            .file_name(file_name)
            .mime_str("text/plain")?;
        let form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", part);

        debug!("sendDocument {} to chat_id={chat_id}", path.display());
        let resp = self
            .client
            .post(format!("{}/sendDocument", self.base_url))
            .multipart(form)
            .send()
            .await?;
        Self::unwrap_response::<serde_json::Value>("sendDocument", resp.json().await?)?;
        Ok(())
    }

    /// Shows a chat action such as "typing" for a few seconds.
    pub async fn send_chat_action(&self, chat_id: &str, activity: Activity) -> Result<(), RelayError> {
        let action = match activity {
            Activity::Typing => "typing",
            Activity::UploadingDocument => "upload_document",
        };
        let resp = self
            .client
            .post(format!("{}/sendChatAction", self.base_url))
            .json(&json!({ "chat_id": chat_id, "action": action }))
            .send()
            .await?;
        Self::unwrap_response::<bool>("sendChatAction", resp.json().await?)?;
        Ok(())
    }

    /// Long-polls for new updates.
    ///
    /// `offset` should be `last_update_id + 1` to acknowledge earlier updates.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, RelayError> {
        let mut body = json!({
            "timeout": timeout_secs,
            "allowed_updates": ["message"],
        });
        if let Some(off) = offset {
            body["offset"] = json!(off);
        }

        let resp = self
            .client
            .post(format!("{}/getUpdates", self.base_url))
            .json(&body)
            .send()
            .await?;
        let api_resp: ApiResponse<Vec<Update>> = resp.json().await?;
        if !api_resp.ok {
            let desc = api_resp.description.unwrap_or_default();
            return Err(RelayError::Api(format!("getUpdates: {desc}")));
        }
        Ok(api_resp.result.unwrap_or_default())
    }

    fn unwrap_response<T: DeserializeOwned>(
        method: &str,
        api_resp: ApiResponse<T>,
    ) -> Result<T, RelayError> {
        if !api_resp.ok {
            let desc = api_resp.description.unwrap_or_default();
            warn!("{method} failed: {desc}");
            return Err(RelayError::Api(format!("{method}: {desc}")));
        }
        api_resp
            .result
            .ok_or_else(|| RelayError::Internal(format!("{method} returned no result")))
    }
}
