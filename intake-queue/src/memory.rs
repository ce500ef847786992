//! In-process queue double for tests: records every publish instead of
//! touching a broker.

use std::sync::Mutex;

use async_trait::async_trait;
use intake_core::{QueueClient, Result};
use serde_json::Value;

#[derive(Default)]
pub struct MemoryQueueClient {
    published: Mutex<Vec<(String, Value)>>,
}

impl MemoryQueueClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, in order, as `(queue, body)` pairs.
    pub fn published(&self) -> Vec<(String, Value)> {
        self.published.lock().unwrap().clone()
    }

    /// Bodies published to one queue, in order.
    pub fn on_queue(&self, queue: &str) -> Vec<Value> {
        self.published
            .lock()
            .unwrap()
            .iter()
            .filter(|(q, _)| q == queue)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl QueueClient for MemoryQueueClient {
    async fn publish(&self, queue: &str, body: &Value) -> Result<()> {
        self.published
            .lock()
            .unwrap()
            .push((queue.to_string(), body.clone()));
        Ok(())
    }
}
