//! Process wiring for the intake pipeline: configuration, the HTTP webhook
//! surface, and the queue consumers that drive the stages.

pub mod app;
pub mod config;
pub mod server;
