//! Batch notification job creation driven end to end through the queue and
//! the notification drain.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use turnstile::core::{EngineError, JobKind, JobPayload, JobState};
use turnstile::queue::{create_notification_jobs, InMemoryJobQueue, JobQueue};
use turnstile::worker::{DrainConfig, NotificationHandler, WorkerPool};

async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(
            tokio::time::Instant::now() < deadline,
            "condition not reached within the deadline"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn test_non_sequence_inputs_raise_validation_and_enqueue_nothing() {
    let queue = InMemoryJobQueue::new(64);
    for input in [
        json!({"phoneNumber": "4153518780", "message": "hi"}),
        json!("not an array"),
        json!(123),
        serde_json::Value::Null,
    ] {
        let err = create_notification_jobs(&input, &queue).await.unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)), "input: {input}");
        assert_eq!(err.to_string(), "Jobs is not an array");
    }
    assert_eq!(queue.pending(JobKind::PushNotification).await.unwrap(), 0);
}

#[tokio::test]
async fn test_batch_jobs_preserve_payloads_and_drain() {
    let queue = Arc::new(InMemoryJobQueue::new(64));
    let jobs = json!([
        {
            "phoneNumber": "4153518780",
            "message": "This is the code 1234 to verify your account"
        },
        {
            "phoneNumber": "4153518743",
            "message": "This is the code 4562 to verify your account"
        }
    ]);

    let ids = create_notification_jobs(&jobs, queue.as_ref()).await.unwrap();
    assert_eq!(ids.len(), 2);

    // Every queued job carries its original payload under the expected kind.
    for (id, expected) in ids.iter().zip(jobs.as_array().unwrap()) {
        let record = queue.job(*id).await.unwrap().unwrap();
        assert_eq!(record.kind, JobKind::PushNotification);
        assert_eq!(record.state, JobState::Queued);
        let JobPayload::Notification(payload) = record.payload else {
            panic!("expected a notification payload");
        };
        assert_eq!(payload.phone_number, expected["phoneNumber"].as_str().unwrap());
        assert_eq!(payload.message, expected["message"].as_str().unwrap());
    }

    let workers = WorkerPool::new(Arc::clone(&queue) as Arc<dyn JobQueue>);
    let handler = NotificationHandler::new(["4153518780".to_owned(), "4153518781".to_owned()]);
    workers.drain(
        JobKind::PushNotification,
        DrainConfig {
            concurrency: 2,
            poll_interval: Duration::from_millis(5),
        },
        Arc::new(handler),
    );

    let counters = workers.counters();
    wait_until(|| counters.settled() == 2).await;

    let first = queue.job(ids[0]).await.unwrap().unwrap();
    assert_eq!(first.state, JobState::Failed);
    assert_eq!(
        first.failure.as_deref(),
        Some("phone number 4153518780 is blacklisted")
    );
    let second = queue.job(ids[1]).await.unwrap().unwrap();
    assert_eq!(second.state, JobState::Complete);
    assert_eq!(second.progress, 100);
}
