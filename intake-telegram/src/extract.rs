//! Normalized extraction from webhook messages.
//!
//! Mirrors what the rest of the pipeline expects: string ids, empty-string
//! defaults for text and caption, and one [`FileInfo`] for the first
//! attachment kind present (photos resolved to the largest size variant).

use intake_core::{AttachmentKind, FileInfo};

use crate::update::IncomingMessage;

/// Message fields the validator works with, identity not yet validated.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedMessage {
    pub user_id: Option<String>,
    pub chat_id: Option<String>,
    pub message_id: Option<i64>,
    pub sender_is_bot: bool,
    pub media_group_id: Option<String>,
    pub text: String,
    pub caption: String,
    pub file_info: Option<FileInfo>,
}

pub fn extract_message(message: &IncomingMessage) -> ExtractedMessage {
    ExtractedMessage {
        user_id: message.from.as_ref().map(|u| u.id.to_string()),
        chat_id: message.chat.as_ref().map(|c| c.id.to_string()),
        message_id: message.message_id,
        sender_is_bot: message.from.as_ref().map(|u| u.is_bot).unwrap_or(false),
        media_group_id: message.media_group_id.clone(),
        text: message.text.clone().unwrap_or_default(),
        caption: message.caption.clone().unwrap_or_default(),
        file_info: extract_attachment(message),
    }
}

/// First attachment present, probing photo, video, document, audio, voice in
/// that order. The photo array lists size variants smallest to largest, so
/// the last entry is taken.
pub fn extract_attachment(message: &IncomingMessage) -> Option<FileInfo> {
    if let Some(photos) = &message.photo {
        if let Some(largest) = photos.last() {
            return Some(FileInfo {
                kind: AttachmentKind::Photo,
                file_id: largest.file_id.clone(),
                file_unique_id: largest.file_unique_id.clone(),
                file_size: largest.file_size,
                mime_type: None,
                file_name: None,
                media_group_id: message.media_group_id.clone(),
                caption: message.caption.clone(),
            });
        }
    }

    let probe = [
        (AttachmentKind::Video, &message.video),
        (AttachmentKind::Document, &message.document),
        (AttachmentKind::Audio, &message.audio),
        (AttachmentKind::Voice, &message.voice),
    ];
    for (kind, slot) in probe {
        if let Some(media) = slot {
            return Some(FileInfo {
                kind,
                file_id: media.file_id.clone(),
                file_unique_id: media.file_unique_id.clone(),
                file_size: media.file_size,
                mime_type: media.mime_type.clone(),
                file_name: media.file_name.clone(),
                media_group_id: message.media_group_id.clone(),
                caption: message.caption.clone(),
            });
        }
    }

    None
}
