//! Queue crate: NATS JetStream transport for the pipeline stages.
//!
//! ## Modules
//!
//! - [`subjects`] – subject builders for the five work queues
//! - [`client`] – connection helpers and the publishing [`NatsQueueClient`]
//! - [`consumer`] – stream/consumer provisioning and the ack/NAK consume loop
//! - [`memory`] – in-process queue double for handler tests

pub mod client;
pub mod consumer;
pub mod memory;
pub mod subjects;

pub use client::{connect, jetstream, NatsQueueClient};
pub use consumer::{consume, create_stage_consumer, setup_pipeline_stream};
pub use memory::MemoryQueueClient;
