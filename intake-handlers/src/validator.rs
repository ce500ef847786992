//! Webhook entry point: validates each update, logs it, and routes it to the
//! right queue. `/start` and `/help` are answered inline and never reach a
//! queue.

use std::sync::Arc;

use chrono::Utc;
use intake_core::{
    CallbackJob, IntakeError, LogClock, LogRecord, MessageLog, MessageType, Outbox, ProcessingJob,
    QueueClient, Result, UploadJob,
};
use intake_telegram::{
    extract_message, CallbackQuery, ExtractedMessage, IncomingMessage, WebhookUpdate,
};
use tracing::{info, instrument, warn};

use crate::config::PipelineQueues;

pub const WELCOME_MESSAGE: &str = "\
👋 Welcome to the project intake bot!

I collect what our team needs to scope your project: a short survey, plus any
files you want to share. Answer in your own words and attach documents,
photos or recordings whenever they help.

Commands:
/start - Show this welcome message
/help - Show usage instructions";

pub const HELP_MESSAGE: &str = "\
ℹ️ Project intake bot

Reply to the current survey question in plain text, or attach files (photos,
videos, documents, audio) and I will store them for the team. I will keep
asking until the survey is complete, then send you a summary.

Available commands:
/start - Show welcome message
/help - Show this help message";

pub struct WebhookValidator {
    log: Arc<dyn MessageLog>,
    queue: Arc<dyn QueueClient>,
    outbox: Arc<Outbox>,
    clock: Arc<LogClock>,
    queues: PipelineQueues,
}

impl WebhookValidator {
    pub fn new(
        log: Arc<dyn MessageLog>,
        queue: Arc<dyn QueueClient>,
        outbox: Arc<Outbox>,
        clock: Arc<LogClock>,
        queues: PipelineQueues,
    ) -> Self {
        WebhookValidator {
            log,
            queue,
            outbox,
            clock,
            queues,
        }
    }

    /// One webhook delivery. `Validation` errors map to a 400 at the HTTP
    /// layer, everything else to a 500.
    #[instrument(skip(self, update))]
    pub async fn handle(&self, update: &WebhookUpdate) -> Result<()> {
        if let Some(message) = &update.message {
            self.handle_message(message).await
        } else if let Some(callback) = &update.callback_query {
            self.handle_callback(callback).await
        } else {
            Err(IntakeError::Validation(
                "update carries neither message nor callback_query".to_string(),
            ))
        }
    }

    async fn handle_message(&self, message: &IncomingMessage) -> Result<()> {
        let data = extract_message(message);
        let (Some(user_id), Some(chat_id)) = (data.user_id.clone(), data.chat_id.clone()) else {
            return Err(IntakeError::Validation(
                "missing user or chat data in message".to_string(),
            ));
        };

        // The probe must run before the append so the row being logged does
        // not count as a prior group member.
        let first_in_group = self.first_in_media_group(data.media_group_id.as_deref()).await;
        self.log_incoming(&data, &user_id, &chat_id).await;

        match data.text.as_str() {
            "/start" => {
                return self
                    .outbox
                    .send(&chat_id, WELCOME_MESSAGE, data.message_id, None)
                    .await;
            }
            "/help" => {
                return self
                    .outbox
                    .send(&chat_id, HELP_MESSAGE, data.message_id, None)
                    .await;
            }
            _ => {}
        }

        let message_id = data.message_id.unwrap_or_default();
        if let Some(file_info) = data.file_info.clone() {
            let job = UploadJob::new(
                chat_id.clone(),
                user_id.clone(),
                message_id,
                data.media_group_id.clone(),
                file_info,
            );
            self.queue
                .publish(&self.queues.upload, &serde_json::to_value(&job)?)
                .await?;
            info!(user_id = %user_id, chat_id = %chat_id, "Routed attachment to upload queue");
            if first_in_group {
                self.outbox
                    .send(&chat_id, "📤 Processing your file...", data.message_id, None)
                    .await?;
            }
            return Ok(());
        }

        let job = ProcessingJob::Text {
            chat_id: chat_id.clone(),
            user_id: user_id.clone(),
            message_id,
            text: data.text.clone(),
        };
        self.queue
            .publish(&self.queues.processing, &serde_json::to_value(&job)?)
            .await?;
        info!(user_id = %user_id, chat_id = %chat_id, "Routed text to processing queue");
        Ok(())
    }

    async fn handle_callback(&self, callback: &CallbackQuery) -> Result<()> {
        let user_id = callback.from.as_ref().map(|u| u.id.to_string());
        let origin = callback.message.as_ref();
        let chat_id = origin
            .and_then(|m| m.chat.as_ref())
            .map(|c| c.id.to_string());
        let (Some(user_id), Some(chat_id)) = (user_id, chat_id) else {
            return Err(IntakeError::Validation(
                "callback_query missing user or chat data".to_string(),
            ));
        };

        let job = CallbackJob {
            callback_id: callback.id.clone(),
            chat_id,
            message_id: origin.and_then(|m| m.message_id).unwrap_or_default(),
            data: callback.data.clone().unwrap_or_default(),
            user_id,
        };
        self.queue
            .publish(&self.queues.callback, &serde_json::to_value(&job)?)
            .await?;
        info!(callback_id = %job.callback_id, "Routed callback to callback queue");
        Ok(())
    }

    /// Whether this message should trigger the one-time "processing" note.
    /// Ungrouped messages always count as first; a failed probe counts as
    /// not-first so the group cannot be acknowledged twice.
    async fn first_in_media_group(&self, media_group_id: Option<&str>) -> bool {
        let Some(group) = media_group_id else {
            return true;
        };
        match self.log.media_group_seen(group).await {
            Ok(seen) => !seen,
            Err(e) => {
                warn!(media_group_id = %group, error = %e, "media group probe failed");
                false
            }
        }
    }

    /// Append failure is swallowed; routing must not depend on the log.
    async fn log_incoming(&self, data: &ExtractedMessage, user_id: &str, chat_id: &str) {
        let record = LogRecord {
            user_id: user_id.to_string(),
            timestamp: self.clock.next_timestamp(),
            message_type: MessageType::UserMessage,
            message: if data.caption.is_empty() {
                data.text.clone()
            } else {
                data.caption.clone()
            },
            telegram_message_id: data.message_id,
            chat_id: chat_id.to_string(),
            sender_id: user_id.to_string(),
            is_bot: data.sender_is_bot,
            media_group_id: data.media_group_id.clone(),
            file_info: data.file_info.clone(),
            ttl: LogRecord::ttl_from(Utc::now()),
        };
        if let Err(e) = self.log.append(&record).await {
            warn!(user_id = %user_id, error = %e, "failed to log incoming message");
        }
    }
}
