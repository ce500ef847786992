//! # intake-handlers
//!
//! The five pipeline stages of the intake bot, plus the configuration they
//! are wired with. Each handler is a plain struct holding `Arc`'d service
//! traits from intake-core; construction is explicit, there are no global
//! singletons, and none of the handlers touches a storage, queue, or HTTP
//! SDK directly.
//!
//! ## Stages
//!
//! - [`validator`] – webhook entry point (validate, log, route)
//! - [`attachments`] – upload-queue consumer (fetch, store, forward)
//! - [`router`] – processing-queue consumer (confirm upload / build AI job)
//! - [`ai`] – AI-queue consumer (next question or summary)
//! - [`callbacks`] – callback-queue consumer (ack + follow-up)
//! - [`sender`] – outgoing-queue consumer (deliver + echo log)

pub mod ai;
pub mod attachments;
pub mod callbacks;
pub mod config;
pub mod router;
pub mod sender;
pub mod validator;

#[cfg(test)]
mod doubles;

#[cfg(test)]
mod callbacks_test;
#[cfg(test)]
mod validator_test;

pub use ai::AiContextProcessor;
pub use attachments::AttachmentFetcher;
pub use callbacks::CallbackProcessor;
pub use config::{PipelineQueues, SurveyConfig};
pub use router::MessageRouter;
pub use sender::MessageSender;
pub use validator::WebhookValidator;
