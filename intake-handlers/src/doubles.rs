//! Hand-rolled service doubles shared by the handler tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use intake_core::{
    BlobStore, InlineKeyboard, IntakeError, LogRecord, MessageLog, Result, SentMessage,
    TelegramApi,
};

/// MessageLog double: records appends, serves preloaded history, and can be
/// told which media groups were already seen or to refuse calls.
#[derive(Default)]
pub struct RecordingLog {
    pub appended: Mutex<Vec<LogRecord>>,
    pub history: Vec<LogRecord>,
    pub seen_groups: Vec<String>,
    pub fail_appends: bool,
    pub fail_probes: bool,
}

impl RecordingLog {
    pub fn appended(&self) -> Vec<LogRecord> {
        self.appended.lock().unwrap().clone()
    }
}

#[async_trait]
impl MessageLog for RecordingLog {
    async fn append(&self, record: &LogRecord) -> Result<()> {
        if self.fail_appends {
            return Err(IntakeError::Storage("append refused".to_string()));
        }
        self.appended.lock().unwrap().push(record.clone());
        Ok(())
    }

    async fn media_group_seen(&self, media_group_id: &str) -> Result<bool> {
        if self.fail_probes {
            return Err(IntakeError::Storage("probe refused".to_string()));
        }
        Ok(self.seen_groups.iter().any(|g| g == media_group_id))
    }

    async fn recent_for_user(&self, user_id: &str, limit: u32) -> Result<Vec<LogRecord>> {
        let mut rows: Vec<LogRecord> = self
            .history
            .iter()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(limit as usize);
        Ok(rows)
    }
}

/// One recorded `send_message` call.
#[derive(Debug, Clone)]
pub struct SentCall {
    pub chat_id: String,
    pub text: String,
    pub reply_to_message_id: Option<i64>,
    pub reply_markup: Option<InlineKeyboard>,
}

/// TelegramApi double with canned file lookups and recorded sends/acks.
#[derive(Default)]
pub struct RecordingApi {
    pub file_paths: HashMap<String, String>,
    pub downloads: HashMap<String, Vec<u8>>,
    pub sent: Mutex<Vec<SentCall>>,
    pub acks: Mutex<Vec<(String, Option<String>)>>,
    pub fail_sends: bool,
}

impl RecordingApi {
    pub fn sent(&self) -> Vec<SentCall> {
        self.sent.lock().unwrap().clone()
    }

    pub fn acks(&self) -> Vec<(String, Option<String>)> {
        self.acks.lock().unwrap().clone()
    }
}

#[async_trait]
impl TelegramApi for RecordingApi {
    async fn get_file(&self, file_id: &str) -> Result<String> {
        self.file_paths
            .get(file_id)
            .cloned()
            .ok_or_else(|| IntakeError::UpstreamApi(format!("unknown file id {file_id}")))
    }

    async fn download(&self, file_path: &str) -> Result<Vec<u8>> {
        self.downloads
            .get(file_path)
            .cloned()
            .ok_or_else(|| IntakeError::UpstreamApi(format!("no bytes for {file_path}")))
    }

    async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_to_message_id: Option<i64>,
        reply_markup: Option<&InlineKeyboard>,
    ) -> Result<SentMessage> {
        if self.fail_sends {
            return Err(IntakeError::Delivery("send refused".to_string()));
        }
        let mut sent = self.sent.lock().unwrap();
        sent.push(SentCall {
            chat_id: chat_id.to_string(),
            text: text.to_string(),
            reply_to_message_id,
            reply_markup: reply_markup.cloned(),
        });
        Ok(SentMessage {
            message_id: 1000 + sent.len() as i64,
            sender_id: "999".to_string(),
            is_bot: true,
        })
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.acks
            .lock()
            .unwrap()
            .push((callback_id.to_string(), text.map(str::to_string)));
        Ok(())
    }
}

/// BlobStore double that fails the first `fail_first` puts, then stores.
#[derive(Default)]
pub struct RecordingBlob {
    pub stored: Mutex<Vec<(String, Vec<u8>)>>,
    pub fail_first: AtomicU32,
    pub attempts: AtomicU32,
}

impl RecordingBlob {
    pub fn failing_first(n: u32) -> Self {
        RecordingBlob {
            fail_first: AtomicU32::new(n),
            ..Default::default()
        }
    }

    pub fn stored(&self) -> Vec<(String, Vec<u8>)> {
        self.stored.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlobStore for RecordingBlob {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_first.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_first.store(remaining - 1, Ordering::SeqCst);
            return Err(IntakeError::Storage("simulated put failure".to_string()));
        }
        self.stored
            .lock()
            .unwrap()
            .push((key.to_string(), bytes.to_vec()));
        Ok(())
    }
}
