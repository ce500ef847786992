//! AI-queue consumer: decides whether the survey is still open and publishes
//! either the next question or the closing summary.

use std::sync::Arc;

use intake_core::{AiContext, QueueClient, Result, SurveyLlm};
use serde_json::Value;
use tracing::{error, info, instrument};

pub struct AiContextProcessor {
    llm: Arc<dyn SurveyLlm>,
    queue: Arc<dyn QueueClient>,
}

impl AiContextProcessor {
    pub fn new(llm: Arc<dyn SurveyLlm>, queue: Arc<dyn QueueClient>) -> Self {
        AiContextProcessor { llm, queue }
    }

    /// Two sequential LLM calls, then one publish to the job's outgoing
    /// queue. Failures are logged with the offending payload before they
    /// propagate.
    #[instrument(skip(self, context))]
    pub async fn handle(&self, context: &AiContext) -> Result<()> {
        match self.generate_and_publish(context).await {
            Ok(()) => Ok(()),
            Err(e) => {
                if let Ok(payload) = serde_json::to_value(context) {
                    error!(error = %e, payload = %payload, "AI processing failed");
                } else {
                    error!(error = %e, "AI processing failed");
                }
                Err(e)
            }
        }
    }

    async fn generate_and_publish(&self, context: &AiContext) -> Result<()> {
        let unanswered = self.llm.unanswered_questions(context).await?;
        let message = if unanswered.is_empty() {
            info!("Survey complete, generating summary");
            self.llm.summary(context).await?
        } else {
            info!(remaining = unanswered.len(), "Generating next question");
            self.llm.next_question(context, &unanswered).await?
        };

        let mut payload = context.outgoing_metadata.clone();
        payload.insert("message".to_string(), Value::String(message));
        self.queue
            .publish(&context.outgoing_queue, &Value::Object(payload))
            .await
    }
}
