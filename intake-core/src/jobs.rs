//! Queue envelopes passed between pipeline stages.
//!
//! Every payload carries an explicit shape (tagged where one queue serves
//! more than one producer) and enough identity to log and to reply. Unknown
//! JSON fields are ignored so stages stay forward-compatible.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{IntakeError, Result};
use crate::types::{ConversationMessage, FileInfo};

/// Work item for the attachment fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadJob {
    /// Stable across redeliveries of the same job; ties retry logs together.
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub chat_id: String,
    pub user_id: String,
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_group_id: Option<String>,
    pub file_info: FileInfo,
}

impl UploadJob {
    /// Fresh job with a new id.
    pub fn new(
        chat_id: impl Into<String>,
        user_id: impl Into<String>,
        message_id: i64,
        media_group_id: Option<String>,
        file_info: FileInfo,
    ) -> Self {
        UploadJob {
            id: Uuid::new_v4(),
            chat_id: chat_id.into(),
            user_id: user_id.into(),
            message_id,
            media_group_id,
            file_info,
        }
    }
}

/// Work item for the message router. The processing queue receives text
/// messages from the validator and uploaded-file notices from the fetcher,
/// so the variant is explicit on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessingJob {
    UploadedFile {
        chat_id: String,
        user_id: String,
        message_id: i64,
        storage_key: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_info: Option<FileInfo>,
    },
    Text {
        chat_id: String,
        user_id: String,
        message_id: i64,
        text: String,
    },
}

/// Work item for the AI stage; assembled fresh by the router, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiContext {
    pub role_context: String,
    pub questions: Vec<String>,
    pub conversation_history: Vec<ConversationMessage>,
    /// Merged verbatim into the outgoing payload alongside the generated text.
    pub outgoing_metadata: Map<String, Value>,
    /// Queue the generated message is published to.
    pub outgoing_queue: String,
}

/// Work item for the callback processor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallbackJob {
    pub callback_id: String,
    pub chat_id: String,
    pub message_id: i64,
    pub data: String,
    pub user_id: String,
}

impl CallbackJob {
    pub fn action(&self) -> CallbackAction {
        CallbackAction::parse(&self.data)
    }
}

/// Button action, parsed once from the raw callback `data` string. An
/// unrecognized payload is not an error; it is acknowledged and dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    /// `confirm_<message_id>`
    Confirm(String),
    /// `delete_<message_id>`
    Delete(String),
    Unknown(String),
}

impl CallbackAction {
    pub fn parse(data: &str) -> Self {
        if let Some(id) = data.strip_prefix("confirm_") {
            CallbackAction::Confirm(id.to_string())
        } else if let Some(id) = data.strip_prefix("delete_") {
            CallbackAction::Delete(id.to_string())
        } else {
            CallbackAction::Unknown(data.to_string())
        }
    }
}

/// Work item for the message sender. Historic producers addressed the user
/// either by `chat_id` or by `user_id`; both are accepted and
/// [`OutgoingMessage::destination`] picks the one to send to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to_message_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboard>,
}

impl OutgoingMessage {
    /// Chat to deliver to: `chat_id` when present, else `user_id` (a private
    /// chat shares the user's id).
    pub fn destination(&self) -> Result<&str> {
        self.chat_id
            .as_deref()
            .or(self.user_id.as_deref())
            .ok_or_else(|| {
                IntakeError::Validation("outgoing message has neither chat_id nor user_id".into())
            })
    }
}

/// Inline keyboard markup, serialized in the chat API's own shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineKeyboard {
    pub inline_keyboard: Vec<Vec<InlineButton>>,
}

impl InlineKeyboard {
    /// Single row of buttons.
    pub fn row(buttons: Vec<InlineButton>) -> Self {
        InlineKeyboard {
            inline_keyboard: vec![buttons],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        InlineButton {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}
