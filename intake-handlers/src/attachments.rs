//! Upload-queue consumer: resolves an attachment through the chat API,
//! downloads it, stores the bytes, and forwards the storage key to the
//! processing queue.

use std::sync::Arc;
use std::time::Duration;

use intake_core::{BlobStore, Outbox, ProcessingJob, QueueClient, Result, TelegramApi, UploadJob};
use tracing::{error, info, instrument, warn};

/// Path segment used when an attachment was not part of a media group.
const NO_MEDIA_GROUP: &str = "no_media_group";

/// Storage key for one attachment, unique per message within a chat.
pub fn storage_key(job: &UploadJob) -> String {
    let group = job.media_group_id.as_deref().unwrap_or(NO_MEDIA_GROUP);
    format!(
        "{}/{}/{}/{}",
        job.chat_id,
        group,
        job.message_id,
        job.file_info.derived_name()
    )
}

pub struct AttachmentFetcher {
    api: Arc<dyn TelegramApi>,
    blobs: Arc<dyn BlobStore>,
    queue: Arc<dyn QueueClient>,
    outbox: Arc<Outbox>,
    processing_queue: String,
    max_retry_attempts: u32,
}

impl AttachmentFetcher {
    pub fn new(
        api: Arc<dyn TelegramApi>,
        blobs: Arc<dyn BlobStore>,
        queue: Arc<dyn QueueClient>,
        outbox: Arc<Outbox>,
        processing_queue: impl Into<String>,
        max_retry_attempts: u32,
    ) -> Self {
        AttachmentFetcher {
            api,
            blobs,
            queue,
            outbox,
            processing_queue: processing_queue.into(),
            max_retry_attempts: max_retry_attempts.max(1),
        }
    }

    /// One upload job end to end. On failure the user is told why and the
    /// error propagates, leaving the job to the queue's redelivery.
    #[instrument(skip(self, job))]
    pub async fn handle(&self, job: &UploadJob) -> Result<()> {
        match self.fetch_and_store(job).await {
            Ok(key) => {
                let next = ProcessingJob::UploadedFile {
                    chat_id: job.chat_id.clone(),
                    user_id: job.user_id.clone(),
                    message_id: job.message_id,
                    storage_key: key,
                    file_info: Some(job.file_info.clone()),
                };
                self.queue
                    .publish(&self.processing_queue, &serde_json::to_value(&next)?)
                    .await
            }
            Err(e) => {
                error!(job_id = %job.id, error = %e, "attachment processing failed");
                self.outbox
                    .send(
                        &job.chat_id,
                        &format!("❌ Failed to process file: {e}"),
                        Some(job.message_id),
                        None,
                    )
                    .await?;
                Err(e)
            }
        }
    }

    async fn fetch_and_store(&self, job: &UploadJob) -> Result<String> {
        let file_path = self.api.get_file(&job.file_info.file_id).await?;
        let bytes = self.api.download(&file_path).await?;
        let key = storage_key(job);
        self.put_with_retry(&key, &bytes).await?;
        info!(job_id = %job.id, key = %key, size = bytes.len(), "Stored attachment");
        Ok(key)
    }

    /// Bounded retry with exponential backoff (1s, 2s, 4s, ...); the last
    /// attempt's failure propagates.
    async fn put_with_retry(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let mut attempt = 0u32;
        loop {
            match self.blobs.put(key, bytes).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt + 1 >= self.max_retry_attempts => return Err(e),
                Err(e) => {
                    warn!(key = %key, attempt, error = %e, "blob put failed, retrying");
                    tokio::time::sleep(Duration::from_secs(1 << attempt)).await;
                    attempt += 1;
                }
            }
        }
    }
}
