//! Unit tests for CallbackProcessor: ack text per action and whether a
//! follow-up message goes out.

use std::sync::Arc;

use intake_core::{CallbackJob, LogClock, Outbox};
use intake_queue::MemoryQueueClient;

use crate::callbacks::CallbackProcessor;
use crate::doubles::{RecordingApi, RecordingLog};

struct Harness {
    api: Arc<RecordingApi>,
    queue: Arc<MemoryQueueClient>,
    processor: CallbackProcessor,
}

fn harness() -> Harness {
    let api = Arc::new(RecordingApi::default());
    let queue = Arc::new(MemoryQueueClient::new());
    let outbox = Arc::new(Outbox::new(
        Arc::new(RecordingLog::default()),
        queue.clone(),
        Arc::new(LogClock::new()),
        "intake.outgoing",
    ));
    let processor = CallbackProcessor::new(api.clone(), outbox);
    Harness {
        api,
        queue,
        processor,
    }
}

fn job(data: &str) -> CallbackJob {
    CallbackJob {
        callback_id: "callback123".to_string(),
        chat_id: "789".to_string(),
        message_id: 55,
        data: data.to_string(),
        user_id: "456".to_string(),
    }
}

#[tokio::test]
async fn confirm_acks_and_thanks() {
    let h = harness();
    h.processor.handle(&job("confirm_55")).await.unwrap();

    assert_eq!(
        h.api.acks(),
        vec![(
            "callback123".to_string(),
            Some("✅ File confirmed!".to_string())
        )]
    );
    let outgoing = h.queue.on_queue("intake.outgoing");
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0]["message"], "Thank you for confirming the file!");
    assert!(outgoing[0].get("reply_to_message_id").is_none());
}

#[tokio::test]
async fn delete_acks_and_notes_pending_deletion() {
    let h = harness();
    h.processor.handle(&job("delete_55")).await.unwrap();

    assert_eq!(
        h.api.acks()[0].1.as_deref(),
        Some("❌ File marked for deletion")
    );
    let outgoing = h.queue.on_queue("intake.outgoing");
    assert_eq!(
        outgoing[0]["message"],
        "File will be deleted (not implemented yet)"
    );
}

#[tokio::test]
async fn unknown_action_acks_without_follow_up() {
    let h = harness();
    h.processor.handle(&job("unknown_x")).await.unwrap();

    assert_eq!(h.api.acks()[0].1.as_deref(), Some("Unknown action"));
    assert!(h.queue.on_queue("intake.outgoing").is_empty());
}
