//! SQLite-backed message log.
//!
//! One row per inbound or outbound message, keyed by `(user_id, timestamp)`,
//! with a secondary index on `media_group_id` for the grouped-attachment
//! de-dup probe. Rows are append-only; expiry is a periodic sweep over `ttl`.

use intake_core::{IntakeError, LogRecord, MessageLog, MessageType, Result};

use async_trait::async_trait;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::SqlitePool;
use tracing::info;

#[derive(Clone)]
pub struct SqliteMessageLog {
    pool: SqlitePool,
}

impl SqliteMessageLog {
    /// Opens (creating if missing) the database behind `database_url`, a
    /// `sqlite:` URL (`sqlite::memory:` included), and ensures the schema
    /// exists.
    pub async fn new(database_url: &str) -> std::result::Result<Self, sqlx::Error> {
        info!("Initializing message log: {}", database_url);

        let options = database_url
            .parse::<SqliteConnectOptions>()?
            .create_if_missing(true);

        let pool = SqlitePool::connect_with(options).await?;
        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> std::result::Result<(), sqlx::Error> {
        info!("Creating message_log table if not exists");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS message_log (
                user_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                message_type TEXT NOT NULL,
                message TEXT NOT NULL,
                telegram_message_id INTEGER,
                chat_id TEXT NOT NULL,
                sender_id TEXT NOT NULL,
                is_bot INTEGER NOT NULL,
                media_group_id TEXT,
                file_info TEXT,
                ttl INTEGER NOT NULL,
                PRIMARY KEY (user_id, timestamp)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_message_log_media_group
                ON message_log(media_group_id);
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes rows whose `ttl` has passed; returns how many went away.
    pub async fn expire_rows(&self) -> Result<u64> {
        let now = chrono::Utc::now().timestamp();
        let result = sqlx::query("DELETE FROM message_log WHERE ttl < ?")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| IntakeError::Storage(e.to_string()))?;

        info!("Expired {} log rows", result.rows_affected());
        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct LogRow {
    user_id: String,
    timestamp: String,
    message_type: String,
    message: String,
    telegram_message_id: Option<i64>,
    chat_id: String,
    sender_id: String,
    is_bot: bool,
    media_group_id: Option<String>,
    file_info: Option<String>,
    ttl: i64,
}

impl LogRow {
    fn into_record(self) -> Result<LogRecord> {
        let message_type = match self.message_type.as_str() {
            "user_message" => MessageType::UserMessage,
            "bot_message" => MessageType::BotMessage,
            other => {
                return Err(IntakeError::Storage(format!(
                    "unknown message_type in log row: {other}"
                )))
            }
        };
        let file_info = match self.file_info {
            Some(json) => Some(
                serde_json::from_str(&json)
                    .map_err(|e| IntakeError::Storage(format!("invalid file_info json: {e}")))?,
            ),
            None => None,
        };
        Ok(LogRecord {
            user_id: self.user_id,
            timestamp: self.timestamp,
            message_type,
            message: self.message,
            telegram_message_id: self.telegram_message_id,
            chat_id: self.chat_id,
            sender_id: self.sender_id,
            is_bot: self.is_bot,
            media_group_id: self.media_group_id,
            file_info,
            ttl: self.ttl,
        })
    }
}

#[async_trait]
impl MessageLog for SqliteMessageLog {
    async fn append(&self, record: &LogRecord) -> Result<()> {
        let file_info = match &record.file_info {
            Some(info) => Some(serde_json::to_string(info)?),
            None => None,
        };

        sqlx::query(
            r#"
            INSERT INTO message_log (
                user_id, timestamp, message_type, message, telegram_message_id,
                chat_id, sender_id, is_bot, media_group_id, file_info, ttl
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.user_id)
        .bind(&record.timestamp)
        .bind(record.message_type.as_str())
        .bind(&record.message)
        .bind(record.telegram_message_id)
        .bind(&record.chat_id)
        .bind(&record.sender_id)
        .bind(record.is_bot)
        .bind(&record.media_group_id)
        .bind(file_info)
        .bind(record.ttl)
        .execute(&self.pool)
        .await
        .map_err(|e| IntakeError::Storage(e.to_string()))?;

        info!(
            "Logged message: user_id={}, timestamp={}",
            record.user_id,
            record.timestamp
        );
        Ok(())
    }

    async fn media_group_seen(&self, media_group_id: &str) -> Result<bool> {
        let row: Option<(i64,)> =
            sqlx::query_as("SELECT 1 FROM message_log WHERE media_group_id = ? LIMIT 1")
                .bind(media_group_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| IntakeError::Storage(e.to_string()))?;

        Ok(row.is_some())
    }

    async fn recent_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<LogRecord>> {
        let rows: Vec<LogRow> = sqlx::query_as(
            r#"
            SELECT user_id, timestamp, message_type, message, telegram_message_id,
                   chat_id, sender_id, is_bot, media_group_id, file_info, ttl
            FROM message_log
            WHERE user_id = ?
            ORDER BY timestamp DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| IntakeError::Storage(e.to_string()))?;

        info!("Retrieved {} log rows for user {}", rows.len(), user_id);

        rows.into_iter().map(LogRow::into_record).collect()
    }
}
