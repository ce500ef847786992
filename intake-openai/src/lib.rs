//! # intake-openai
//!
//! [`SurveyLlm`] implementation over [async-openai]: unanswered-question
//! detection in JSON mode, conversational phrasing of the next question, and
//! the closing summary once every question is answered.

use std::sync::Arc;

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs, ResponseFormat,
};
use async_openai::Client;
use async_trait::async_trait;
use intake_core::{AiContext, IntakeError, Result, SurveyLlm};
use serde_json::Value;
use tracing::{debug, info};

/// Model used when the deployment does not override it.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Survey-side chat client. Wraps a shared async-openai client; cloning is
/// cheap and every pipeline stage holds the same connection pool.
#[derive(Clone)]
pub struct OpenAiSurveyClient {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiSurveyClient {
    pub fn new(api_key: String, model: String) -> Self {
        let config = OpenAIConfig::new().with_api_key(api_key);
        Self {
            client: Arc::new(Client::with_config(config)),
            model,
        }
    }

    /// Builds a client with a custom base URL (proxies, compatible endpoints,
    /// test servers).
    pub fn with_base_url(api_key: String, base_url: String, model: String) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url);
        Self {
            client: Arc::new(Client::with_config(config)),
            model,
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// One system+user completion round trip. `json_mode` constrains the
    /// model to emit a JSON object.
    async fn complete(
        &self,
        system_prompt: String,
        user_prompt: &str,
        json_mode: bool,
    ) -> Result<String> {
        let system_message: ChatCompletionRequestMessage =
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system_prompt)
                .build()
                .map_err(|e| IntakeError::UpstreamApi(e.to_string()))?
                .into();
        let user_message: ChatCompletionRequestMessage =
            ChatCompletionRequestUserMessageArgs::default()
                .content(user_prompt)
                .build()
                .map_err(|e| IntakeError::UpstreamApi(e.to_string()))?
                .into();

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(&self.model)
            .messages(vec![system_message, user_message]);
        if json_mode {
            builder.response_format(ResponseFormat::JsonObject);
        }
        let request = builder
            .build()
            .map_err(|e| IntakeError::UpstreamApi(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| IntakeError::UpstreamApi(e.to_string()))?;

        if let Some(ref usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Chat completion usage"
            );
        }

        if let Some(choice) = response.choices.first() {
            Ok(choice.message.content.clone().unwrap_or_default())
        } else {
            Err(IntakeError::UpstreamApi(
                "chat completion returned no choices".to_string(),
            ))
        }
    }
}

/// System prompt for unanswered-question detection. Exposed for tests.
pub fn detection_prompt(context: &AiContext) -> Result<String> {
    Ok(format!(
        "You are an AI assistant analyzing a conversation. Your task is to determine \
         which questions from the list have not been clearly answered yet. \
         Context: {role}\n\n\
         Questions to check:\n{questions}\n\n\
         Conversation history:\n{history}\n\n\
         Return a JSON object with an \"unanswered_questions\" array containing the \
         questions that still need answers. If all questions are answered, return an \
         empty array.",
        role = context.role_context,
        questions = serde_json::to_string_pretty(&context.questions)?,
        history = history_json(context)?,
    ))
}

/// System prompt for phrasing the next question. Exposed for tests.
pub fn next_question_prompt(context: &AiContext, unanswered: &[String]) -> Result<String> {
    Ok(format!(
        "You are an AI assistant with this role: {role}\n\n\
         Your task is to ask the next question from this list in a natural, \
         conversational way:\n{unanswered}\n\n\
         Previous conversation:\n{history}\n\n\
         Generate a friendly, contextual way to ask the next question.",
        role = context.role_context,
        unanswered = serde_json::to_string_pretty(unanswered)?,
        history = history_json(context)?,
    ))
}

/// System prompt for the closing summary. Exposed for tests.
pub fn summary_prompt(context: &AiContext) -> Result<String> {
    Ok(format!(
        "You are an AI assistant with this role: {role}\n\n\
         All questions have been answered. Generate a summary of the conversation \
         addressing these points:\n{questions}\n\n\
         Conversation history:\n{history}\n\n\
         Provide a concise but comprehensive summary.",
        role = context.role_context,
        questions = serde_json::to_string_pretty(&context.questions)?,
        history = history_json(context)?,
    ))
}

/// Pulls the `unanswered_questions` array out of a JSON-mode reply. A missing
/// key or non-string entries read as "nothing unanswered"; malformed JSON is
/// an error. Exposed for tests.
pub fn parse_unanswered(raw: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(raw)?;
    Ok(value
        .get("unanswered_questions")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default())
}

/// Conversation history as the `[{"role", "content"}]` JSON the prompts embed.
fn history_json(context: &AiContext) -> Result<String> {
    let turns: Vec<Value> = context
        .conversation_history
        .iter()
        .map(|m| serde_json::json!({"role": m.role, "content": m.content}))
        .collect();
    Ok(serde_json::to_string_pretty(&turns)?)
}

#[async_trait]
impl SurveyLlm for OpenAiSurveyClient {
    async fn unanswered_questions(&self, context: &AiContext) -> Result<Vec<String>> {
        let raw = self
            .complete(
                detection_prompt(context)?,
                "Analyze the conversation and list unanswered questions",
                true,
            )
            .await?;
        let unanswered = parse_unanswered(&raw)?;
        info!(
            total = context.questions.len(),
            unanswered = unanswered.len(),
            "Checked survey progress"
        );
        Ok(unanswered)
    }

    async fn next_question(&self, context: &AiContext, unanswered: &[String]) -> Result<String> {
        self.complete(
            next_question_prompt(context, unanswered)?,
            "Generate the next question",
            false,
        )
        .await
    }

    async fn summary(&self, context: &AiContext) -> Result<String> {
        self.complete(summary_prompt(context)?, "Generate summary", false)
            .await
    }
}
