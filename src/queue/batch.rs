//! Batch creation of push notification jobs.

use crate::core::{EngineError, JobId, JobKind, JobPayload, NotificationPayload};
use crate::queue::JobQueue;

/// Create one push-notification job per element of `jobs`.
///
/// `jobs` must be a JSON array; any other shape (object, string, number,
/// null) is rejected synchronously and nothing is enqueued. Elements are
/// validated up front for the same reason. Payload fields are preserved
/// verbatim on the queued jobs.
///
/// # Errors
///
/// `Validation` for a non-array input or a malformed element; enqueue
/// failures are propagated from the queue.
pub async fn create_notification_jobs(
    jobs: &serde_json::Value,
    queue: &dyn JobQueue,
) -> Result<Vec<JobId>, EngineError> {
    let Some(entries) = jobs.as_array() else {
        return Err(EngineError::Validation("Jobs is not an array".to_owned()));
    };

    let payloads = entries
        .iter()
        .map(|entry| {
            serde_json::from_value::<NotificationPayload>(entry.clone()).map_err(|e| {
                EngineError::Validation(format!("malformed notification payload: {e}"))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut ids = Vec::with_capacity(payloads.len());
    for payload in payloads {
        let id = queue
            .enqueue(JobKind::PushNotification, JobPayload::Notification(payload))
            .await?;
        tracing::info!("notification job created: {}", id);
        ids.push(id);
    }
    Ok(ids)
}
