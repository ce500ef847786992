//! Serde models for webhook bodies.
//!
//! Only the fields the pipeline reads are modeled; everything else in the
//! provider's payload is ignored. Every field is optional so a partial body
//! deserializes and validation happens downstream, not in serde.

use serde::Deserialize;

/// One webhook delivery: a message, a callback press, or (tolerated) neither.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebhookUpdate {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncomingMessage {
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub from: Option<UserRef>,
    #[serde(default)]
    pub chat: Option<ChatRef>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_group_id: Option<String>,
    /// Size variants, smallest first; the last entry is the largest.
    #[serde(default)]
    pub photo: Option<Vec<PhotoSize>>,
    #[serde(default)]
    pub video: Option<MediaAttachment>,
    #[serde(default)]
    pub document: Option<MediaAttachment>,
    #[serde(default)]
    pub audio: Option<MediaAttachment>,
    #[serde(default)]
    pub voice: Option<MediaAttachment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserRef {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatRef {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    #[serde(default)]
    pub file_unique_id: String,
    #[serde(default)]
    pub file_size: Option<i64>,
}

/// Common shape of video/document/audio/voice attachments.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaAttachment {
    pub file_id: String,
    #[serde(default)]
    pub file_unique_id: String,
    #[serde(default)]
    pub file_size: Option<i64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    #[serde(default)]
    pub from: Option<UserRef>,
    /// The message the pressed button was attached to.
    #[serde(default)]
    pub message: Option<IncomingMessage>,
    #[serde(default)]
    pub data: Option<String>,
}
