//! Stream provisioning and the consume loop shared by every pipeline stage.
//!
//! Messages are pulled from a durable consumer, decoded, and handed to the
//! stage handler: `Ok` acks, `Err` NAKs for redelivery. A payload that fails
//! to decode is acked after an error log, since it would fail identically on
//! every redelivery.

use std::future::Future;
use std::time::Duration;

use async_nats::jetstream::consumer::{pull, Consumer};
use async_nats::jetstream::{self, stream, AckKind};
use futures::StreamExt;
use intake_core::{IntakeError, Result};
use serde::de::DeserializeOwned;
use tracing::{error, info, warn};

use crate::subjects;

/// How long undelivered queue messages survive. Conversation data lives in
/// the message log; the queues only carry work in flight.
const MAX_MESSAGE_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Creates (or finds) the stream capturing every `{prefix}.>` queue subject.
pub async fn setup_pipeline_stream(js: &jetstream::Context, prefix: &str) -> Result<()> {
    let stream_name = subjects::stream_name(prefix);
    info!("Setting up JetStream stream: {}", stream_name);

    let config = stream::Config {
        name: stream_name.clone(),
        subjects: vec![subjects::all(prefix)],
        max_age: MAX_MESSAGE_AGE,
        storage: stream::StorageType::File,
        retention: stream::RetentionPolicy::Limits,
        ..Default::default()
    };

    js.get_or_create_stream(config)
        .await
        .map_err(|e| IntakeError::Queue(format!("failed to create stream {stream_name}: {e}")))?;

    info!("JetStream stream {} ready", stream_name);
    Ok(())
}

/// Durable pull consumer for one stage, filtered to that stage's subject.
pub async fn create_stage_consumer(
    js: &jetstream::Context,
    prefix: &str,
    stage_subject: &str,
    durable: &str,
) -> Result<Consumer<pull::Config>> {
    let stream = js
        .get_stream(subjects::stream_name(prefix))
        .await
        .map_err(|e| IntakeError::Queue(format!("failed to get pipeline stream: {e}")))?;

    stream
        .get_or_create_consumer(
            durable,
            pull::Config {
                durable_name: Some(durable.to_string()),
                filter_subject: stage_subject.to_string(),
                ..Default::default()
            },
        )
        .await
        .map_err(|e| IntakeError::Queue(format!("failed to create consumer {durable}: {e}")))
}

/// Runs one stage's consume loop until the message stream ends or the
/// transport fails.
pub async fn consume<T, F, Fut>(
    consumer: Consumer<pull::Config>,
    stage: &str,
    mut handle: F,
) -> Result<()>
where
    T: DeserializeOwned,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = Result<()>>,
{
    let mut messages = consumer
        .messages()
        .await
        .map_err(|e| IntakeError::Queue(format!("failed to open {stage} messages: {e}")))?;

    info!("Consuming {} queue", stage);

    while let Some(next) = messages.next().await {
        let msg =
            next.map_err(|e| IntakeError::Queue(format!("{stage} message stream failed: {e}")))?;

        match serde_json::from_slice::<T>(&msg.payload) {
            Err(e) => {
                error!(stage = stage, error = %e, "dropping undecodable queue message");
                if let Err(e) = msg.ack().await {
                    warn!(stage = stage, "failed to ack undecodable message: {}", e);
                }
            }
            Ok(job) => match handle(job).await {
                Ok(()) => {
                    if let Err(e) = msg.ack().await {
                        warn!(stage = stage, "failed to ack message: {}", e);
                    }
                }
                Err(e) => {
                    error!(
                        stage = stage,
                        error = %e,
                        "handler failed; message will be redelivered"
                    );
                    if let Err(e) = msg.ack_with(AckKind::Nak(None)).await {
                        warn!(stage = stage, "failed to nak message: {}", e);
                    }
                }
            },
        }
    }

    Ok(())
}
