//! HTTP client for the four Bot API calls the pipeline makes.

use async_trait::async_trait;
use intake_core::{InlineKeyboard, IntakeError, Result, SentMessage, TelegramApi};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::update::UserRef;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Sender id recorded when the API echo carries no `from` user.
const BOT_SENDER_FALLBACK: &str = "bot";

/// Thin client over the Bot API. One instance is shared across handlers;
/// `reqwest::Client` pools connections internally.
#[derive(Debug, Clone)]
pub struct TelegramClient {
    http: Client,
    base_url: String,
    token: String,
}

impl TelegramClient {
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, TELEGRAM_API_BASE)
    }

    /// Point the client at a different API host (test server, local proxy).
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        TelegramClient {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Downloads use a separate path scheme from method calls.
    fn file_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }
}

/// Standard Bot API envelope: `ok` plus either `result` or `description`.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    #[serde(default)]
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    /// The payload, or the API's own description of what went wrong.
    fn into_result(self, method: &str) -> std::result::Result<T, String> {
        if !self.ok {
            return Err(self
                .description
                .unwrap_or_else(|| format!("{method} returned ok=false")));
        }
        self.result
            .ok_or_else(|| format!("{method} returned no result"))
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileHandle {
    #[serde(default)]
    file_path: Option<String>,
}

/// The API's echo of a sent message; only the fields the log needs.
#[derive(Debug, Default, Deserialize)]
struct MessageEcho {
    message_id: i64,
    #[serde(default)]
    from: Option<UserRef>,
}

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_message_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a InlineKeyboard>,
}

#[derive(Debug, Serialize)]
struct AnswerCallbackRequest<'a> {
    callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<&'a str>,
}

#[async_trait]
impl TelegramApi for TelegramClient {
    async fn get_file(&self, file_id: &str) -> Result<String> {
        debug!(file_id = %file_id, "Resolving file id");
        let response = self
            .http
            .get(self.method_url("getFile"))
            .query(&[("file_id", file_id)])
            .send()
            .await
            .map_err(|e| IntakeError::UpstreamApi(format!("getFile request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::UpstreamApi(format!(
                "getFile returned {status}: {body}"
            )));
        }
        let envelope: ApiResponse<FileHandle> = response
            .json()
            .await
            .map_err(|e| IntakeError::UpstreamApi(format!("getFile response unreadable: {e}")))?;
        let handle = envelope
            .into_result("getFile")
            .map_err(IntakeError::UpstreamApi)?;
        handle
            .file_path
            .ok_or_else(|| IntakeError::UpstreamApi("getFile result had no file_path".into()))
    }

    async fn download(&self, file_path: &str) -> Result<Vec<u8>> {
        let response = self
            .http
            .get(self.file_url(file_path))
            .send()
            .await
            .map_err(|e| IntakeError::UpstreamApi(format!("file download failed: {e}")))?;
        if !response.status().is_success() {
            return Err(IntakeError::UpstreamApi(format!(
                "file download returned {}",
                response.status()
            )));
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| IntakeError::UpstreamApi(format!("file download truncated: {e}")))?;
        debug!(file_path = %file_path, size = bytes.len(), "Downloaded file");
        Ok(bytes.to_vec())
    }

    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_to_message_id: Option<i64>,
        reply_markup: Option<&InlineKeyboard>,
    ) -> Result<SentMessage> {
        let request = SendMessageRequest {
            chat_id,
            text,
            parse_mode: "HTML",
            reply_to_message_id,
            reply_markup,
        };
        let response = self
            .http
            .post(self.method_url("sendMessage"))
            .json(&request)
            .send()
            .await
            .map_err(|e| IntakeError::Delivery(format!("sendMessage request failed: {e}")))?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(chat_id = %chat_id, status = %status, "sendMessage rejected");
            return Err(IntakeError::Delivery(format!(
                "sendMessage returned {status}: {body}"
            )));
        }
        let envelope: ApiResponse<MessageEcho> = response.json().await.map_err(|e| {
            IntakeError::Delivery(format!("sendMessage response unreadable: {e}"))
        })?;
        let echo = envelope
            .into_result("sendMessage")
            .map_err(IntakeError::Delivery)?;
        debug!(chat_id = %chat_id, message_id = echo.message_id, "Message sent");
        Ok(SentMessage {
            message_id: echo.message_id,
            sender_id: echo
                .from
                .as_ref()
                .map(|u| u.id.to_string())
                .unwrap_or_else(|| BOT_SENDER_FALLBACK.to_string()),
            is_bot: echo.from.as_ref().map(|u| u.is_bot).unwrap_or(true),
        })
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let request = AnswerCallbackRequest {
            callback_query_id: callback_id,
            text,
        };
        let response = self
            .http
            .post(self.method_url("answerCallbackQuery"))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                IntakeError::UpstreamApi(format!("answerCallbackQuery request failed: {e}"))
            })?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IntakeError::UpstreamApi(format!(
                "answerCallbackQuery returned {status}: {body}"
            )));
        }
        Ok(())
    }
}
