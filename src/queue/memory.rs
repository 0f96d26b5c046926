//! In-memory job queue for development and testing.

use std::collections::{HashMap, VecDeque};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{EngineError, JobId, JobKind, JobPayload, JobRecord, JobState, QueuedJob};
use crate::queue::JobQueue;
use crate::util::clock::now_ms;

#[derive(Debug, Default)]
struct Inner {
    next_id: JobId,
    records: HashMap<JobId, JobRecord>,
    ready: HashMap<JobKind, VecDeque<JobId>>,
}

impl Inner {
    fn queued_total(&self) -> usize {
        self.ready.values().map(VecDeque::len).sum()
    }
}

/// Process-local queue storing job records in a map and per-kind FIFO lanes.
#[derive(Debug)]
pub struct InMemoryJobQueue {
    max_depth: usize,
    inner: Mutex<Inner>,
}

impl InMemoryJobQueue {
    /// Create a queue holding at most `max_depth` undelivered jobs.
    #[must_use]
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            inner: Mutex::new(Inner::default()),
        }
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, kind: JobKind, payload: JobPayload) -> Result<JobId, EngineError> {
        let mut inner = self.inner.lock();
        if inner.queued_total() >= self.max_depth {
            return Err(EngineError::QueueFull(format!(
                "max queue depth {} reached",
                self.max_depth
            )));
        }
        inner.next_id += 1;
        let id = inner.next_id;
        inner.records.insert(
            id,
            JobRecord {
                id,
                kind,
                payload,
                state: JobState::Queued,
                progress: 0,
                failure: None,
                created_at_ms: now_ms(),
            },
        );
        inner.ready.entry(kind).or_default().push_back(id);
        Ok(id)
    }

    async fn next_ready(&self, kind: JobKind) -> Result<Option<QueuedJob>, EngineError> {
        let mut inner = self.inner.lock();
        let Some(id) = inner.ready.entry(kind).or_default().pop_front() else {
            return Ok(None);
        };
        let record = inner
            .records
            .get_mut(&id)
            .ok_or_else(|| EngineError::Backend(format!("job {id} vanished from the queue")))?;
        record.state = JobState::Active;
        Ok(Some(QueuedJob {
            id,
            kind,
            payload: record.payload.clone(),
        }))
    }

    async fn report_progress(&self, id: JobId, progress: u8) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        let record = active_record(&mut inner, id)?;
        // Progress is monotone while active; stale lower reports are kept out.
        if progress > record.progress {
            record.progress = progress.min(100);
        }
        Ok(())
    }

    async fn complete(&self, id: JobId) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        let record = active_record(&mut inner, id)?;
        record.state = JobState::Complete;
        record.progress = 100;
        Ok(())
    }

    async fn fail(&self, id: JobId, reason: &str) -> Result<(), EngineError> {
        let mut inner = self.inner.lock();
        let record = active_record(&mut inner, id)?;
        record.state = JobState::Failed;
        record.failure = Some(reason.to_owned());
        Ok(())
    }

    async fn job(&self, id: JobId) -> Result<Option<JobRecord>, EngineError> {
        Ok(self.inner.lock().records.get(&id).cloned())
    }

    async fn pending(&self, kind: JobKind) -> Result<usize, EngineError> {
        Ok(self
            .inner
            .lock()
            .ready
            .get(&kind)
            .map_or(0, VecDeque::len))
    }
}

fn active_record(inner: &mut Inner, id: JobId) -> Result<&mut JobRecord, EngineError> {
    let record = inner
        .records
        .get_mut(&id)
        .ok_or_else(|| EngineError::Backend(format!("unknown job {id}")))?;
    if record.state != JobState::Active {
        return Err(EngineError::Backend(format!(
            "job {id} is {} and cannot transition",
            record.state
        )));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NotificationPayload;

    fn notification(n: u32) -> JobPayload {
        JobPayload::Notification(NotificationPayload {
            phone_number: format!("415351878{n}"),
            message: format!("code {n}"),
        })
    }

    #[tokio::test]
    async fn test_fifo_per_kind() {
        let q = InMemoryJobQueue::new(16);
        let a = q.enqueue(JobKind::PushNotification, notification(1)).await.unwrap();
        let s = q.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await.unwrap();
        let b = q.enqueue(JobKind::PushNotification, notification(2)).await.unwrap();

        // Each kind drains in its own enqueue order.
        assert_eq!(q.next_ready(JobKind::PushNotification).await.unwrap().unwrap().id, a);
        assert_eq!(q.next_ready(JobKind::ReserveSeat).await.unwrap().unwrap().id, s);
        assert_eq!(q.next_ready(JobKind::PushNotification).await.unwrap().unwrap().id, b);
        assert!(q.next_ready(JobKind::PushNotification).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_no_redelivery_while_active() {
        let q = InMemoryJobQueue::new(16);
        q.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await.unwrap();
        let job = q.next_ready(JobKind::ReserveSeat).await.unwrap().unwrap();
        assert!(q.next_ready(JobKind::ReserveSeat).await.unwrap().is_none());
        q.complete(job.id).await.unwrap();
        assert!(q.next_ready(JobKind::ReserveSeat).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_queue_full() {
        let q = InMemoryJobQueue::new(2);
        q.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await.unwrap();
        q.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await.unwrap();
        let err = q.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await.unwrap_err();
        assert!(matches!(err, EngineError::QueueFull(_)));
    }

    #[tokio::test]
    async fn test_terminal_states_are_immutable() {
        let q = InMemoryJobQueue::new(16);
        q.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await.unwrap();
        let job = q.next_ready(JobKind::ReserveSeat).await.unwrap().unwrap();
        q.fail(job.id, "not enough seats available").await.unwrap();

        assert!(q.complete(job.id).await.is_err());
        assert!(q.report_progress(job.id, 50).await.is_err());
        let record = q.job(job.id).await.unwrap().unwrap();
        assert_eq!(record.state, JobState::Failed);
        assert_eq!(record.failure.as_deref(), Some("not enough seats available"));
    }

    #[tokio::test]
    async fn test_progress_is_monotone() {
        let q = InMemoryJobQueue::new(16);
        q.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await.unwrap();
        let job = q.next_ready(JobKind::ReserveSeat).await.unwrap().unwrap();
        q.report_progress(job.id, 50).await.unwrap();
        q.report_progress(job.id, 25).await.unwrap();
        assert_eq!(q.job(job.id).await.unwrap().unwrap().progress, 50);
    }

    #[tokio::test]
    async fn test_progress_on_queued_job_is_rejected() {
        let q = InMemoryJobQueue::new(16);
        let id = q.enqueue(JobKind::ReserveSeat, JobPayload::Seat).await.unwrap();
        assert!(q.report_progress(id, 10).await.is_err());
    }
}
