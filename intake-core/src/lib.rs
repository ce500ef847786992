//! # intake-core
//!
//! Shared types and service traits for the intake bot pipeline: log records,
//! queue envelopes, the error taxonomy, and the trait seams every handler
//! depends on. Transport-agnostic; used by intake-storage, intake-queue,
//! intake-telegram, intake-openai and intake-handlers.
//!
//! ## Modules
//!
//! - [`types`] – LogRecord, FileInfo, ConversationMessage
//! - [`jobs`] – queue envelopes passed between pipeline stages
//! - [`error`] – IntakeError taxonomy
//! - [`services`] – MessageLog, QueueClient, BlobStore, TelegramApi, SurveyLlm
//! - [`clock`] – strictly increasing log timestamps
//! - [`outbox`] – log-then-enqueue helper for outgoing replies

pub mod clock;
pub mod error;
pub mod jobs;
pub mod outbox;
pub mod services;
pub mod types;

pub use clock::LogClock;
pub use error::{IntakeError, Result};
pub use jobs::{
    AiContext, CallbackAction, CallbackJob, InlineButton, InlineKeyboard, OutgoingMessage,
    ProcessingJob, UploadJob,
};
pub use outbox::Outbox;
pub use services::{BlobStore, MessageLog, QueueClient, SurveyLlm, TelegramApi};
pub use types::{
    AttachmentKind, ConversationMessage, FileInfo, LogRecord, MessageType, Role, SentMessage,
};
