//! Service traits every handler composes through.
//!
//! Handlers receive these as `Arc<dyn …>` at construction and never touch the
//! storage, queue, or HTTP SDKs directly. Implementations live in
//! intake-storage, intake-queue, intake-telegram and intake-openai.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;
use crate::jobs::{AiContext, InlineKeyboard};
use crate::types::{LogRecord, SentMessage};

/// Append-only message log plus the two lookups the pipeline needs.
#[async_trait]
pub trait MessageLog: Send + Sync {
    async fn append(&self, record: &LogRecord) -> Result<()>;
    /// Whether any row for this media group has been logged already
    /// (limit-1 existence probe on the media-group index).
    async fn media_group_seen(&self, media_group_id: &str) -> Result<bool>;
    /// Most recent rows for a user, newest first, capped at `limit`.
    async fn recent_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<LogRecord>>;
}

/// Publisher onto a named work queue.
#[async_trait]
pub trait QueueClient: Send + Sync {
    async fn publish(&self, queue: &str, body: &Value) -> Result<()>;
}

/// Keyed byte storage; a later put to the same key wins.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()>;
}

/// The four chat API calls the pipeline uses.
#[async_trait]
pub trait TelegramApi: Send + Sync {
    /// Resolves a file id to a transient download path.
    async fn get_file(&self, file_id: &str) -> Result<String>;
    /// Downloads the raw bytes behind a path from [`TelegramApi::get_file`].
    async fn download(&self, file_path: &str) -> Result<Vec<u8>>;
    /// Sends a message and returns the provider's echo of it.
    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_to_message_id: Option<i64>,
        reply_markup: Option<&InlineKeyboard>,
    ) -> Result<SentMessage>;
    /// Acknowledges a button press, clearing the client-side pending state.
    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}

/// The three LLM calls of the survey stage.
#[async_trait]
pub trait SurveyLlm: Send + Sync {
    /// Questions from `context.questions` not yet clearly answered, in the
    /// model's order; empty means the survey is complete.
    async fn unanswered_questions(&self, context: &AiContext) -> Result<Vec<String>>;
    /// Conversational phrasing of the next question to ask.
    async fn next_question(&self, context: &AiContext, unanswered: &[String]) -> Result<String>;
    /// Closing summary once every question is answered.
    async fn summary(&self, context: &AiContext) -> Result<String>;
}
