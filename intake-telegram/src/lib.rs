//! Telegram crate: the Bot API client and webhook-body handling.
//!
//! ## Modules
//!
//! - [`update`] – serde models for webhook bodies (tolerant of partial input)
//! - [`extract`] – normalized message/attachment extraction
//! - [`api`] – TelegramClient (getFile, file download, sendMessage,
//!   answerCallbackQuery)

pub mod api;
pub mod extract;
pub mod update;

pub use api::TelegramClient;
pub use extract::{extract_attachment, extract_message, ExtractedMessage};
pub use update::{CallbackQuery, ChatRef, IncomingMessage, UserRef, WebhookUpdate};
