//! Core records: the message log row, attachment descriptors, and the
//! conversation-history view handed to the AI stage.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a log row stays queryable before the store may expire it.
pub const LOG_TTL_DAYS: i64 = 90;

/// Direction of a logged message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    UserMessage,
    BotMessage,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::UserMessage => "user_message",
            MessageType::BotMessage => "bot_message",
        }
    }
}

/// Attachment categories the pipeline recognizes, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentKind {
    Photo,
    Video,
    Document,
    Audio,
    Voice,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Photo => "photo",
            AttachmentKind::Video => "video",
            AttachmentKind::Document => "document",
            AttachmentKind::Audio => "audio",
            AttachmentKind::Voice => "voice",
        }
    }
}

/// Descriptor of one attachment, extracted from a webhook message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileInfo {
    #[serde(rename = "type")]
    pub kind: AttachmentKind,
    pub file_id: String,
    /// Stable identifier across bots; empty when the provider omitted it.
    #[serde(default)]
    pub file_unique_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
}

impl FileInfo {
    /// Extension for the stored object. Photos are always `.jpg`; other kinds
    /// map from the mime type, with unknown types yielding no extension.
    pub fn extension(&self) -> &'static str {
        if self.kind == AttachmentKind::Photo {
            return ".jpg";
        }
        match self.mime_type.as_deref() {
            Some("image/jpeg") => ".jpg",
            Some("image/png") => ".png",
            Some("image/gif") => ".gif",
            Some("video/mp4") => ".mp4",
            Some("audio/mpeg") => ".mp3",
            Some("audio/ogg") => ".ogg",
            Some("application/pdf") => ".pdf",
            _ => "",
        }
    }

    /// Name the stored object: the provider-supplied file name when present,
    /// else `{file_unique_id}{extension}`, else an epoch-based fallback.
    pub fn derived_name(&self) -> String {
        if let Some(name) = &self.file_name {
            if !name.is_empty() {
                return name.clone();
            }
        }
        if !self.file_unique_id.is_empty() {
            return format!("{}{}", self.file_unique_id, self.extension());
        }
        format!("file_{}", Utc::now().timestamp())
    }
}

/// One row of the message log; written once per processed message at each
/// logging point and never mutated. `(user_id, timestamp)` is the unique key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub user_id: String,
    /// RFC 3339 with nanoseconds; lexicographic order is chronological.
    pub timestamp: String,
    pub message_type: MessageType,
    /// Message text, or the caption when the message carried an attachment.
    pub message: String,
    pub telegram_message_id: Option<i64>,
    pub chat_id: String,
    pub sender_id: String,
    pub is_bot: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_info: Option<FileInfo>,
    /// Epoch seconds after which the store may drop the row.
    pub ttl: i64,
}

impl LogRecord {
    /// TTL for a row created at `now`.
    pub fn ttl_from(now: DateTime<Utc>) -> i64 {
        (now + Duration::days(LOG_TTL_DAYS)).timestamp()
    }
}

/// Speaker role in the conversation history handed to the LLM.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn of conversation history, derived from a [`LogRecord`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl From<&LogRecord> for ConversationMessage {
    fn from(record: &LogRecord) -> Self {
        ConversationMessage {
            role: if record.is_bot { Role::Assistant } else { Role::User },
            content: record.message.clone(),
            timestamp: record.timestamp.clone(),
        }
    }
}

/// The chat API's echo of a sent message; carries the provider-assigned
/// identifiers, which the sender logs instead of its own guesses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentMessage {
    pub message_id: i64,
    pub sender_id: String,
    pub is_bot: bool,
}
