//! Subject names for the pipeline queues.
//!
//! Pattern: `{prefix}.{stage}`. One JetStream stream per prefix captures
//! `{prefix}.>`, so every stage queue is durable and redelivered on NAK.

/// Upload queue: validator → attachment fetcher.
pub fn upload(prefix: &str) -> String {
    format!("{}.upload", prefix)
}

/// Processing queue: validator / attachment fetcher → router.
pub fn processing(prefix: &str) -> String {
    format!("{}.processing", prefix)
}

/// AI queue: router → AI context processor.
pub fn ai(prefix: &str) -> String {
    format!("{}.ai", prefix)
}

/// Callback queue: validator → callback processor.
pub fn callback(prefix: &str) -> String {
    format!("{}.callback", prefix)
}

/// Outgoing queue: everything → message sender.
pub fn outgoing(prefix: &str) -> String {
    format!("{}.outgoing", prefix)
}

/// Wildcard the pipeline stream subscribes to.
pub fn all(prefix: &str) -> String {
    format!("{}.>", prefix)
}

/// Name of the JetStream stream backing the queues.
pub fn stream_name(prefix: &str) -> String {
    format!("{}_pipeline", prefix)
}
