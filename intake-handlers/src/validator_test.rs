//! Unit tests for WebhookValidator.
//!
//! Covers identity validation, inline command replies, attachment vs text
//! routing, the media-group one-time acknowledgment, and callback
//! normalization.

use std::sync::Arc;

use intake_core::{IntakeError, LogClock, MessageType, Outbox};
use intake_queue::MemoryQueueClient;
use intake_telegram::WebhookUpdate;
use serde_json::json;

use crate::config::PipelineQueues;
use crate::doubles::RecordingLog;
use crate::validator::WebhookValidator;

fn queues() -> PipelineQueues {
    PipelineQueues {
        upload: "intake.upload".to_string(),
        processing: "intake.processing".to_string(),
        ai: "intake.ai".to_string(),
        callback: "intake.callback".to_string(),
        outgoing: "intake.outgoing".to_string(),
    }
}

struct Harness {
    log: Arc<RecordingLog>,
    queue: Arc<MemoryQueueClient>,
    validator: WebhookValidator,
}

fn harness(log: RecordingLog) -> Harness {
    let log = Arc::new(log);
    let queue = Arc::new(MemoryQueueClient::new());
    let clock = Arc::new(LogClock::new());
    let outbox = Arc::new(Outbox::new(
        log.clone(),
        queue.clone(),
        clock.clone(),
        "intake.outgoing",
    ));
    let validator = WebhookValidator::new(log.clone(), queue.clone(), outbox, clock, queues());
    Harness {
        log,
        queue,
        validator,
    }
}

fn update(body: serde_json::Value) -> WebhookUpdate {
    serde_json::from_value(body).unwrap()
}

fn text_update(text: &str) -> WebhookUpdate {
    update(json!({
        "message": {
            "message_id": 123,
            "from": {"id": 456, "is_bot": false},
            "chat": {"id": 789},
            "text": text
        }
    }))
}

#[tokio::test]
async fn text_message_is_logged_and_routed() {
    let h = harness(RecordingLog::default());
    h.validator
        .handle(&text_update("Hello, world!"))
        .await
        .unwrap();

    let rows = h.log.appended();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, "456");
    assert_eq!(rows[0].chat_id, "789");
    assert_eq!(rows[0].message, "Hello, world!");
    assert_eq!(rows[0].message_type, MessageType::UserMessage);

    let processing = h.queue.on_queue("intake.processing");
    assert_eq!(processing.len(), 1);
    assert_eq!(processing[0]["kind"], "text");
    assert_eq!(processing[0]["text"], "Hello, world!");
    assert_eq!(processing[0]["user_id"], "456");
    assert!(h.queue.on_queue("intake.upload").is_empty());
}

#[tokio::test]
async fn missing_identity_is_rejected() {
    let h = harness(RecordingLog::default());
    let err = h
        .validator
        .handle(&update(json!({"message": {"message_id": 1, "text": "hi"}})))
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::Validation(_)));
    assert!(h.log.appended().is_empty());
    assert!(h.queue.published().is_empty());
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let h = harness(RecordingLog::default());
    let err = h.validator.handle(&update(json!({}))).await.unwrap_err();
    assert!(matches!(err, IntakeError::Validation(_)));
}

#[tokio::test]
async fn commands_short_circuit_before_any_queue() {
    for (command, marker) in [("/start", "Welcome"), ("/help", "help")] {
        let h = harness(RecordingLog::default());
        h.validator.handle(&text_update(command)).await.unwrap();

        assert!(h.queue.on_queue("intake.processing").is_empty());
        assert!(h.queue.on_queue("intake.upload").is_empty());
        let outgoing = h.queue.on_queue("intake.outgoing");
        assert_eq!(outgoing.len(), 1);
        assert!(outgoing[0]["message"].as_str().unwrap().contains(marker));
        assert_eq!(outgoing[0]["reply_to_message_id"], 123);

        // the command row plus the outbox audit row
        let rows = h.log.appended();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].message, command);
        assert_eq!(rows[1].user_id, "bot");
    }
}

#[tokio::test]
async fn document_goes_to_upload_queue_with_ack() {
    let h = harness(RecordingLog::default());
    h.validator
        .handle(&update(json!({
            "message": {
                "message_id": 125,
                "from": {"id": 456, "is_bot": false},
                "chat": {"id": 789},
                "document": {
                    "file_id": "doc123",
                    "file_unique_id": "doc_unique",
                    "file_name": "test.pdf",
                    "mime_type": "application/pdf",
                    "file_size": 1024
                }
            }
        })))
        .await
        .unwrap();

    let upload = h.queue.on_queue("intake.upload");
    assert_eq!(upload.len(), 1);
    assert_eq!(upload[0]["file_info"]["file_name"], "test.pdf");
    assert_eq!(upload[0]["file_info"]["mime_type"], "application/pdf");
    assert_eq!(upload[0]["message_id"], 125);

    let outgoing = h.queue.on_queue("intake.outgoing");
    assert_eq!(outgoing.len(), 1);
    assert_eq!(outgoing[0]["message"], "📤 Processing your file...");
    assert!(h.queue.on_queue("intake.processing").is_empty());
}

fn grouped_photo_update(message_id: i64) -> serde_json::Value {
    json!({
        "message": {
            "message_id": message_id,
            "from": {"id": 456, "is_bot": false},
            "chat": {"id": 789},
            "media_group_id": "mg1",
            "photo": [
                {"file_id": "small", "file_unique_id": "s", "file_size": 100},
                {"file_id": "large", "file_unique_id": "l", "file_size": 2000}
            ]
        }
    })
}

#[tokio::test]
async fn media_group_is_acknowledged_once() {
    let first = harness(RecordingLog::default());
    first
        .validator
        .handle(&update(grouped_photo_update(10)))
        .await
        .unwrap();
    assert_eq!(first.queue.on_queue("intake.outgoing").len(), 1);

    let rest = harness(RecordingLog {
        seen_groups: vec!["mg1".to_string()],
        ..Default::default()
    });
    rest.validator
        .handle(&update(grouped_photo_update(11)))
        .await
        .unwrap();
    // still uploaded, but no second acknowledgment
    assert_eq!(rest.queue.on_queue("intake.upload").len(), 1);
    assert!(rest.queue.on_queue("intake.outgoing").is_empty());
}

#[tokio::test]
async fn probe_failure_suppresses_the_ack() {
    let h = harness(RecordingLog {
        fail_probes: true,
        ..Default::default()
    });
    h.validator
        .handle(&update(grouped_photo_update(12)))
        .await
        .unwrap();
    assert_eq!(h.queue.on_queue("intake.upload").len(), 1);
    assert!(h.queue.on_queue("intake.outgoing").is_empty());
}

#[tokio::test]
async fn photo_upload_carries_largest_variant() {
    let h = harness(RecordingLog::default());
    h.validator
        .handle(&update(grouped_photo_update(13)))
        .await
        .unwrap();
    let upload = h.queue.on_queue("intake.upload");
    assert_eq!(upload[0]["file_info"]["file_id"], "large");
    assert_eq!(upload[0]["file_info"]["type"], "photo");
}

#[tokio::test]
async fn redelivered_update_routes_identically_without_dedup() {
    let h = harness(RecordingLog::default());
    let update = text_update("Hello, world!");
    h.validator.handle(&update).await.unwrap();
    h.validator.handle(&update).await.unwrap();

    // two independent rows, distinct timestamps
    let rows = h.log.appended();
    assert_eq!(rows.len(), 2);
    assert_ne!(rows[0].timestamp, rows[1].timestamp);

    let processing = h.queue.on_queue("intake.processing");
    assert_eq!(processing.len(), 2);
    assert_eq!(processing[0], processing[1]);
}

#[tokio::test]
async fn append_failure_does_not_block_routing() {
    let h = harness(RecordingLog {
        fail_appends: true,
        ..Default::default()
    });
    h.validator
        .handle(&text_update("still routed"))
        .await
        .unwrap();
    assert_eq!(h.queue.on_queue("intake.processing").len(), 1);
}

#[tokio::test]
async fn callback_is_normalized_and_queued() {
    let h = harness(RecordingLog::default());
    h.validator
        .handle(&update(json!({
            "callback_query": {
                "id": "callback123",
                "from": {"id": 456, "is_bot": false},
                "message": {
                    "message_id": 126,
                    "chat": {"id": 789},
                    "text": "Original message"
                },
                "data": "test_callback"
            }
        })))
        .await
        .unwrap();

    let callbacks = h.queue.on_queue("intake.callback");
    assert_eq!(callbacks.len(), 1);
    assert_eq!(callbacks[0]["callback_id"], "callback123");
    assert_eq!(callbacks[0]["data"], "test_callback");
    assert_eq!(callbacks[0]["chat_id"], "789");
    assert_eq!(callbacks[0]["user_id"], "456");
    assert_eq!(callbacks[0]["message_id"], 126);
    // button presses are not log rows
    assert!(h.log.appended().is_empty());
}

#[tokio::test]
async fn callback_without_identity_is_rejected() {
    let h = harness(RecordingLog::default());
    let err = h
        .validator
        .handle(&update(json!({
            "callback_query": {"id": "cb1", "data": "confirm_1"}
        })))
        .await
        .unwrap_err();
    assert!(matches!(err, IntakeError::Validation(_)));
    assert!(h.queue.published().is_empty());
}
