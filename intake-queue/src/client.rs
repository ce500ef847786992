//! NATS connection management and the publishing side of the queue layer.

use async_nats::jetstream;
use async_nats::Client;
use async_trait::async_trait;
use intake_core::{IntakeError, QueueClient, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Connects to the NATS server with reconnect handling. The returned client
/// retries forever on connection loss.
pub async fn connect(url: &str) -> Result<Client> {
    info!("Connecting to NATS server: {}", url);

    let client = async_nats::ConnectOptions::new()
        .name("intake-bot")
        .event_callback(|event| async move {
            match event {
                async_nats::Event::Connected => info!("Connected to NATS"),
                async_nats::Event::Disconnected => warn!("Disconnected from NATS"),
                async_nats::Event::ClientError(e) => warn!("NATS client error: {}", e),
                _ => {}
            }
        })
        .retry_on_initial_connect()
        .max_reconnects(None)
        .connect(url)
        .await
        .map_err(|e| IntakeError::Queue(format!("failed to connect to NATS: {e}")))?;

    info!("Successfully connected to NATS");
    Ok(client)
}

/// JetStream context over a connected client.
pub fn jetstream(client: &Client) -> jetstream::Context {
    jetstream::new(client.clone())
}

/// Publishes queue payloads through JetStream, awaiting the PubAck so a
/// message is durably stored before the producing stage moves on.
#[derive(Clone)]
pub struct NatsQueueClient {
    js: jetstream::Context,
}

impl NatsQueueClient {
    pub fn new(js: jetstream::Context) -> Self {
        NatsQueueClient { js }
    }
}

#[async_trait]
impl QueueClient for NatsQueueClient {
    async fn publish(&self, queue: &str, body: &Value) -> Result<()> {
        let payload = serde_json::to_vec(body)?;

        let ack = self
            .js
            .publish(queue.to_string(), payload.into())
            .await
            .map_err(|e| IntakeError::Queue(format!("publish to {queue} failed: {e}")))?;
        ack.await
            .map_err(|e| IntakeError::Queue(format!("PubAck for {queue} failed: {e}")))?;

        debug!("Published message to {}", queue);
        Ok(())
    }
}
