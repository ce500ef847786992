//! Error taxonomy shared by all pipeline stages.
//!
//! Queue consumers map `Err` to a NAK (redelivery); the webhook endpoint maps
//! `Validation` to a 400 response and everything else to a 500.

use thiserror::Error;

/// Errors that can occur while a handler processes one record.
#[derive(Error, Debug)]
pub enum IntakeError {
    /// Malformed or incomplete input; surfaced as 4xx to the webhook caller.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Non-success response from the chat or LLM API.
    #[error("Upstream API error: {0}")]
    UpstreamApi(String),
    /// Log-store or blob-store failure.
    #[error("Storage error: {0}")]
    Storage(String),
    /// Outgoing send failed at the chat API.
    #[error("Delivery error: {0}")]
    Delivery(String),
    /// Publish or consume failure at the queue layer.
    #[error("Queue error: {0}")]
    Queue(String),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type Result<T> = std::result::Result<T, IntakeError>;
