//! Reservation queue backends.

pub mod batch;
pub mod memory;
pub mod redis;

pub use batch::create_notification_jobs;
pub use memory::InMemoryJobQueue;
pub use redis::RedisJobQueue;

use async_trait::async_trait;

use crate::core::{EngineError, JobId, JobKind, JobPayload, JobRecord, QueuedJob};

/// Ordered, single-delivery job queue, FIFO per job kind.
///
/// The queue owns job existence; a worker owns the active transition
/// exclusively. A delivered job is never redelivered while active, and
/// terminal states (`complete`, `failed`) are final and immutable.
///
/// Lifecycle outcomes live on the job record and are polled by the creator
/// through [`JobQueue::job`]; there are no registered listener callbacks.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Create a job in the `queued` state and return its identifier.
    ///
    /// A failure here is distinguishable (`QueueFull`, `StoreUnavailable`)
    /// and guarantees no duplicate was enqueued.
    async fn enqueue(&self, kind: JobKind, payload: JobPayload) -> Result<JobId, EngineError>;

    /// Deliver the next queued job of `kind`, transitioning it to `active`.
    async fn next_ready(&self, kind: JobKind) -> Result<Option<QueuedJob>, EngineError>;

    /// Record progress (0-100) on an active job; non-decreasing.
    async fn report_progress(&self, id: JobId, progress: u8) -> Result<(), EngineError>;

    /// Transition an active job to `complete` (progress becomes 100).
    async fn complete(&self, id: JobId) -> Result<(), EngineError>;

    /// Transition an active job to `failed` with a cause.
    async fn fail(&self, id: JobId, reason: &str) -> Result<(), EngineError>;

    /// Snapshot a job record by id.
    async fn job(&self, id: JobId) -> Result<Option<JobRecord>, EngineError>;

    /// Number of jobs of `kind` waiting for delivery.
    async fn pending(&self, kind: JobKind) -> Result<usize, EngineError>;
}
