//! Outgoing-queue consumer: the only stage that calls the send API, and the
//! only logging path carrying provider-assigned message identifiers.

use std::sync::Arc;

use chrono::Utc;
use intake_core::{
    LogClock, LogRecord, MessageLog, MessageType, OutgoingMessage, Result, TelegramApi,
};
use tracing::{info, instrument, warn};

pub struct MessageSender {
    api: Arc<dyn TelegramApi>,
    log: Arc<dyn MessageLog>,
    clock: Arc<LogClock>,
}

impl MessageSender {
    pub fn new(api: Arc<dyn TelegramApi>, log: Arc<dyn MessageLog>, clock: Arc<LogClock>) -> Self {
        MessageSender { api, log, clock }
    }

    /// Delivers one message and logs the API's echo of it. A send failure
    /// propagates; a log failure does not.
    #[instrument(skip(self, outgoing))]
    pub async fn handle(&self, outgoing: &OutgoingMessage) -> Result<()> {
        let chat_id = outgoing.destination()?;
        let sent = self
            .api
            .send_message(
                chat_id,
                &outgoing.message,
                outgoing.reply_to_message_id,
                outgoing.reply_markup.as_ref(),
            )
            .await?;
        info!(chat_id = %chat_id, message_id = sent.message_id, "Delivered message");

        let record = LogRecord {
            user_id: chat_id.to_string(),
            timestamp: self.clock.next_timestamp(),
            message_type: MessageType::BotMessage,
            message: outgoing.message.clone(),
            telegram_message_id: Some(sent.message_id),
            chat_id: chat_id.to_string(),
            sender_id: sent.sender_id.clone(),
            is_bot: sent.is_bot,
            media_group_id: None,
            file_info: None,
            ttl: LogRecord::ttl_from(Utc::now()),
        };
        if let Err(e) = self.log.append(&record).await {
            warn!(chat_id = %chat_id, error = %e, "failed to log sent message");
        }
        Ok(())
    }
}
