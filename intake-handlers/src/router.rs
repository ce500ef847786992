//! Processing-queue consumer. Uploaded files get a confirmation with inline
//! actions; text messages get a conversation-history window assembled and
//! handed to the AI stage.

use std::sync::Arc;

use intake_core::{
    AiContext, ConversationMessage, InlineButton, InlineKeyboard, MessageLog, Outbox,
    ProcessingJob, QueueClient, Result,
};
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::config::SurveyConfig;

/// Most recent log rows considered when rebuilding a conversation.
const HISTORY_LIMIT: u32 = 100;

pub struct MessageRouter {
    log: Arc<dyn MessageLog>,
    queue: Arc<dyn QueueClient>,
    outbox: Arc<Outbox>,
    survey: SurveyConfig,
    ai_queue: String,
    outgoing_queue: String,
}

impl MessageRouter {
    pub fn new(
        log: Arc<dyn MessageLog>,
        queue: Arc<dyn QueueClient>,
        outbox: Arc<Outbox>,
        survey: SurveyConfig,
        ai_queue: impl Into<String>,
        outgoing_queue: impl Into<String>,
    ) -> Self {
        MessageRouter {
            log,
            queue,
            outbox,
            survey,
            ai_queue: ai_queue.into(),
            outgoing_queue: outgoing_queue.into(),
        }
    }

    #[instrument(skip(self, job))]
    pub async fn handle(&self, job: &ProcessingJob) -> Result<()> {
        match job {
            ProcessingJob::UploadedFile {
                chat_id,
                message_id,
                storage_key,
                ..
            } => self.confirm_upload(chat_id, *message_id, storage_key).await,
            ProcessingJob::Text {
                chat_id,
                user_id,
                message_id,
                ..
            } => self.forward_to_ai(chat_id, user_id, *message_id).await,
        }
    }

    async fn confirm_upload(
        &self,
        chat_id: &str,
        message_id: i64,
        storage_key: &str,
    ) -> Result<()> {
        let markup = InlineKeyboard::row(vec![
            InlineButton::new("✅ Confirm", format!("confirm_{message_id}")),
            InlineButton::new("❌ Delete", format!("delete_{message_id}")),
        ]);
        self.outbox
            .send(
                chat_id,
                &format!("✅ File has been uploaded successfully: {storage_key}"),
                Some(message_id),
                Some(markup),
            )
            .await
    }

    /// The triggering text is already in the log (the validator appended it
    /// before routing), so the history window covers it.
    async fn forward_to_ai(&self, chat_id: &str, user_id: &str, message_id: i64) -> Result<()> {
        let rows = self.log.recent_for_user(user_id, HISTORY_LIMIT).await?;
        let mut history: Vec<ConversationMessage> =
            rows.iter().map(ConversationMessage::from).collect();
        history.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));

        let mut metadata = Map::new();
        metadata.insert("chat_id".to_string(), Value::String(chat_id.to_string()));
        metadata.insert("user_id".to_string(), Value::String(user_id.to_string()));
        metadata.insert("reply_to_message_id".to_string(), Value::from(message_id));

        let context = AiContext {
            role_context: self.survey.role_context.clone(),
            questions: self.survey.questions.clone(),
            conversation_history: history,
            outgoing_metadata: metadata,
            outgoing_queue: self.outgoing_queue.clone(),
        };
        self.queue
            .publish(&self.ai_queue, &serde_json::to_value(&context)?)
            .await?;
        info!(
            user_id = %user_id,
            history_len = context.conversation_history.len(),
            "Forwarded conversation to AI queue"
        );
        Ok(())
    }
}
