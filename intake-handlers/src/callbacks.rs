//! Callback-queue consumer: acknowledges button presses and sends the
//! follow-up message the pressed action calls for.

use std::sync::Arc;

use intake_core::{CallbackAction, CallbackJob, Outbox, Result, TelegramApi};
use tracing::debug;

pub struct CallbackProcessor {
    api: Arc<dyn TelegramApi>,
    outbox: Arc<Outbox>,
}

impl CallbackProcessor {
    pub fn new(api: Arc<dyn TelegramApi>, outbox: Arc<Outbox>) -> Self {
        CallbackProcessor { api, outbox }
    }

    /// An unrecognized action is acknowledged and dropped, not failed.
    pub async fn handle(&self, job: &CallbackJob) -> Result<()> {
        match job.action() {
            CallbackAction::Confirm(_) => {
                self.api
                    .answer_callback(&job.callback_id, Some("✅ File confirmed!"))
                    .await?;
                self.outbox
                    .send(&job.chat_id, "Thank you for confirming the file!", None, None)
                    .await
            }
            CallbackAction::Delete(_) => {
                self.api
                    .answer_callback(&job.callback_id, Some("❌ File marked for deletion"))
                    .await?;
                self.outbox
                    .send(
                        &job.chat_id,
                        "File will be deleted (not implemented yet)",
                        None,
                        None,
                    )
                    .await
            }
            CallbackAction::Unknown(data) => {
                debug!(data = %data, "Unrecognized callback action");
                self.api
                    .answer_callback(&job.callback_id, Some("Unknown action"))
                    .await
            }
        }
    }
}
