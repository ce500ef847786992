//! Outgoing-reply helper shared by every stage that talks back to the user.
//!
//! `send` appends a synthetic bot-message row to the log, then publishes an
//! [`OutgoingMessage`] for the sender stage. The synthetic row is an audit
//! copy keyed under the `bot` partition; the authoritative copy (carrying the
//! provider-assigned message id) is written by the sender from the API echo,
//! so per-user history never sees the message twice.

use std::sync::Arc;

use chrono::Utc;
use tracing::warn;

use crate::clock::LogClock;
use crate::error::Result;
use crate::jobs::{InlineKeyboard, OutgoingMessage};
use crate::services::{MessageLog, QueueClient};
use crate::types::{LogRecord, MessageType};

/// Sender identity used for audit rows before the provider confirms a send.
pub const BOT_SENDER: &str = "bot";

pub struct Outbox {
    log: Arc<dyn MessageLog>,
    queue: Arc<dyn QueueClient>,
    clock: Arc<LogClock>,
    outgoing_queue: String,
}

impl Outbox {
    pub fn new(
        log: Arc<dyn MessageLog>,
        queue: Arc<dyn QueueClient>,
        clock: Arc<LogClock>,
        outgoing_queue: impl Into<String>,
    ) -> Self {
        Outbox {
            log,
            queue,
            clock,
            outgoing_queue: outgoing_queue.into(),
        }
    }

    /// Queue a reply to `chat_id`. The audit log append is best-effort; a
    /// failed append is logged and the message still goes out.
    pub async fn send(
        &self,
        chat_id: &str,
        text: &str,
        reply_to_message_id: Option<i64>,
        reply_markup: Option<InlineKeyboard>,
    ) -> Result<()> {
        let record = LogRecord {
            user_id: BOT_SENDER.to_string(),
            timestamp: self.clock.next_timestamp(),
            message_type: MessageType::BotMessage,
            message: text.to_string(),
            // The sent message has no id yet; the reply target ties the row
            // back to what triggered it.
            telegram_message_id: reply_to_message_id,
            chat_id: chat_id.to_string(),
            sender_id: BOT_SENDER.to_string(),
            is_bot: true,
            media_group_id: None,
            file_info: None,
            ttl: LogRecord::ttl_from(Utc::now()),
        };
        if let Err(e) = self.log.append(&record).await {
            warn!(chat_id = %chat_id, error = %e, "failed to log outgoing message");
        }

        let outgoing = OutgoingMessage {
            chat_id: Some(chat_id.to_string()),
            user_id: None,
            message: text.to_string(),
            reply_to_message_id,
            reply_markup,
        };
        self.queue
            .publish(&self.outgoing_queue, &serde_json::to_value(&outgoing)?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::Value;

    use crate::error::IntakeError;
    use crate::jobs::InlineButton;

    #[derive(Default)]
    struct RecordingLog {
        rows: Mutex<Vec<LogRecord>>,
        fail: bool,
    }

    #[async_trait]
    impl MessageLog for RecordingLog {
        async fn append(&self, record: &LogRecord) -> Result<()> {
            if self.fail {
                return Err(IntakeError::Storage("append refused".into()));
            }
            self.rows.lock().unwrap().push(record.clone());
            Ok(())
        }

        async fn media_group_seen(&self, _media_group_id: &str) -> Result<bool> {
            Ok(false)
        }

        async fn recent_for_user(&self, _user_id: &str, _limit: u32) -> Result<Vec<LogRecord>> {
            Ok(Vec::new())
        }
    }

    #[derive(Default)]
    struct RecordingQueue {
        published: Mutex<Vec<(String, Value)>>,
    }

    #[async_trait]
    impl QueueClient for RecordingQueue {
        async fn publish(&self, queue: &str, body: &Value) -> Result<()> {
            self.published
                .lock()
                .unwrap()
                .push((queue.to_string(), body.clone()));
            Ok(())
        }
    }

    fn outbox(log: Arc<RecordingLog>, queue: Arc<RecordingQueue>) -> Outbox {
        Outbox::new(log, queue, Arc::new(LogClock::new()), "intake.outgoing")
    }

    #[tokio::test]
    async fn send_logs_audit_row_and_publishes() {
        let log = Arc::new(RecordingLog::default());
        let queue = Arc::new(RecordingQueue::default());
        let outbox = outbox(Arc::clone(&log), Arc::clone(&queue));

        outbox
            .send("789", "📤 Processing your file...", Some(42), None)
            .await
            .unwrap();

        let rows = log.rows.lock().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_id, BOT_SENDER);
        assert_eq!(rows[0].sender_id, BOT_SENDER);
        assert!(rows[0].is_bot);
        assert_eq!(rows[0].message_type, MessageType::BotMessage);
        assert_eq!(rows[0].chat_id, "789");
        assert_eq!(rows[0].telegram_message_id, Some(42));
        assert_eq!(rows[0].message, "📤 Processing your file...");

        let published = queue.published.lock().unwrap();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "intake.outgoing");
        assert_eq!(published[0].1["chat_id"], "789");
        assert_eq!(published[0].1["message"], "📤 Processing your file...");
        assert_eq!(published[0].1["reply_to_message_id"], 42);
    }

    #[tokio::test]
    async fn send_carries_reply_markup() {
        let log = Arc::new(RecordingLog::default());
        let queue = Arc::new(RecordingQueue::default());
        let outbox = outbox(log, Arc::clone(&queue));

        let markup = InlineKeyboard::row(vec![InlineButton::new("✅ Confirm", "confirm_7")]);
        outbox.send("789", "confirm?", Some(7), Some(markup)).await.unwrap();

        let published = queue.published.lock().unwrap();
        assert_eq!(
            published[0].1["reply_markup"]["inline_keyboard"][0][0]["callback_data"],
            "confirm_7"
        );
    }

    #[tokio::test]
    async fn failed_append_still_publishes() {
        let log = Arc::new(RecordingLog {
            fail: true,
            ..Default::default()
        });
        let queue = Arc::new(RecordingQueue::default());
        let outbox = outbox(log, Arc::clone(&queue));

        outbox.send("789", "hello", None, None).await.unwrap();

        assert_eq!(queue.published.lock().unwrap().len(), 1);
    }
}
