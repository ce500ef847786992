//! Process configuration: CLI flags backed by environment variables, with
//! `.env` loaded by the binary beforehand. A required value missing from both
//! sources fails startup with clap's usage error.

use clap::Parser;
use intake_handlers::SurveyConfig;

/// Telegram intake bot: webhook server plus the queue consumers behind it.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Telegram bot token.
    #[arg(long, env = "TELEGRAM_BOT_TOKEN", hide_env_values = true)]
    pub telegram_bot_token: String,

    /// Telegram Bot API base URL; point at a mock server in tests.
    #[arg(
        long,
        env = "TELEGRAM_API_URL",
        default_value = "https://api.telegram.org"
    )]
    pub telegram_api_url: String,

    /// SQLite URL for the message log.
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:intake.db")]
    pub database_url: String,

    /// Directory uploaded files are stored under.
    #[arg(long, env = "BLOB_ROOT", default_value = "./blobs")]
    pub blob_root: String,

    /// NATS server URL.
    #[arg(long, env = "NATS_URL", default_value = "nats://localhost:4222")]
    pub nats_url: String,

    /// Subject prefix for the work queues.
    #[arg(long, env = "QUEUE_PREFIX", default_value = "intake")]
    pub queue_prefix: String,

    /// Blob store attempts per upload before the job is failed.
    #[arg(long, env = "MAX_RETRY_ATTEMPTS", default_value_t = 3)]
    pub max_retry_attempts: u32,

    /// OpenAI API key for the survey stage.
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Chat model the survey stage calls.
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o")]
    pub openai_model: String,

    /// Address the webhook server binds.
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: String,

    /// Role description for the survey assistant; a default ships in code.
    #[arg(long, env = "SURVEY_ROLE")]
    pub survey_role: Option<String>,

    /// Semicolon-separated survey questions; defaults ship in code.
    #[arg(long, env = "SURVEY_QUESTIONS")]
    pub survey_questions: Option<String>,
}

impl Config {
    /// Survey definition assembled from the optional overrides.
    pub fn survey(&self) -> SurveyConfig {
        SurveyConfig::from_env_parts(self.survey_role.clone(), self.survey_questions.clone())
    }
}
