//! Worker pool draining the reservation queue.

pub mod handlers;
pub mod trail;

pub use handlers::{NotificationHandler, SeatReservationHandler};
pub use trail::JobTrail;

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::core::{EngineError, JobId, JobKind, JobState, QueuedJob};
use crate::queue::JobQueue;

/// Handler invoked for each delivered job of a kind.
///
/// An `Err` is terminal for that job; the display form of the error becomes
/// the recorded failure cause. There is no automatic retry.
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Execute one job.
    async fn handle(&self, job: &QueuedJob, ctx: &JobContext) -> Result<(), EngineError>;
}

/// Per-job view handed to handlers for progress reporting.
pub struct JobContext {
    queue: Arc<dyn JobQueue>,
    /// Identifier of the job being processed.
    pub job_id: JobId,
}

impl JobContext {
    /// Report progress (0-100) on the job being processed.
    ///
    /// # Errors
    ///
    /// Propagates queue failures.
    pub async fn progress(&self, progress: u8) -> Result<(), EngineError> {
        self.queue.report_progress(self.job_id, progress).await
    }
}

/// Lock-free counters describing drain activity.
#[derive(Debug, Default)]
pub struct JobCounters {
    delivered: AtomicU64,
    active: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time view of [`JobCounters`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    /// Jobs handed to a worker so far.
    pub delivered: u64,
    /// Jobs currently being processed.
    pub active: u64,
    /// Jobs that reached `complete`.
    pub completed: u64,
    /// Jobs that reached `failed`.
    pub failed: u64,
}

impl JobCounters {
    /// Snapshot the current counter values.
    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    /// Jobs that reached a terminal state.
    pub fn settled(&self) -> u64 {
        self.completed.load(Ordering::Relaxed) + self.failed.load(Ordering::Relaxed)
    }
}

/// Settings for one drain loop.
#[derive(Debug, Clone)]
pub struct DrainConfig {
    /// Maximum simultaneously active jobs of the drained kind.
    pub concurrency: u32,
    /// Sleep between polls when the lane is empty.
    pub poll_interval: Duration,
}

/// Consumer group draining job kinds at bounded concurrency.
///
/// Slot accounting is a CAS loop on an atomic with a notify-on-release wake,
/// so a full pool parks instead of spinning. Seat commits are expected to be
/// drained at concurrency 1; kinds that touch no shared counter may go wider.
pub struct WorkerPool {
    queue: Arc<dyn JobQueue>,
    trail: Option<JobTrail>,
    counters: Arc<JobCounters>,
    shutdown: Arc<AtomicBool>,
}

impl WorkerPool {
    /// Create a pool over a queue.
    #[must_use]
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self {
            queue,
            trail: None,
            counters: Arc::new(JobCounters::default()),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Attach a store-backed job trail recording terminal outcomes.
    #[must_use]
    pub fn with_trail(mut self, trail: JobTrail) -> Self {
        self.trail = Some(trail);
        self
    }

    /// Shared counters for observation.
    #[must_use]
    pub fn counters(&self) -> Arc<JobCounters> {
        Arc::clone(&self.counters)
    }

    /// Ask all drain loops to stop after their in-flight jobs finish.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
    }

    /// Start a drain loop for `kind`, processing up to
    /// `config.concurrency` jobs simultaneously.
    pub fn drain(
        &self,
        kind: JobKind,
        config: DrainConfig,
        handler: Arc<dyn JobHandler>,
    ) -> tokio::task::JoinHandle<()> {
        let queue = Arc::clone(&self.queue);
        let trail = self.trail.clone();
        let counters = Arc::clone(&self.counters);
        let shutdown = Arc::clone(&self.shutdown);

        tokio::spawn(async move {
            tracing::info!(
                "draining {} jobs at concurrency {}",
                kind,
                config.concurrency
            );
            let active_slots = Arc::new(AtomicU32::new(0));
            let released = Arc::new(Notify::new());

            loop {
                if shutdown.load(Ordering::Acquire) {
                    tracing::info!("drain loop for {} shutting down", kind);
                    break;
                }

                if !try_reserve_slot(&active_slots, config.concurrency) {
                    released.notified().await;
                    continue;
                }

                match queue.next_ready(kind).await {
                    Ok(Some(job)) => {
                        counters.delivered.fetch_add(1, Ordering::Relaxed);
                        counters.active.fetch_add(1, Ordering::Relaxed);
                        let queue = Arc::clone(&queue);
                        let trail = trail.clone();
                        let counters = Arc::clone(&counters);
                        let handler = Arc::clone(&handler);
                        let active_slots = Arc::clone(&active_slots);
                        let released = Arc::clone(&released);
                        tokio::spawn(async move {
                            process_job(job, queue, trail, &counters, handler.as_ref()).await;
                            counters.active.fetch_sub(1, Ordering::Relaxed);
                            active_slots.fetch_sub(1, Ordering::Release);
                            released.notify_one();
                        });
                    }
                    Ok(None) => {
                        active_slots.fetch_sub(1, Ordering::Release);
                        released.notify_one();
                        tokio::time::sleep(config.poll_interval).await;
                    }
                    Err(e) => {
                        active_slots.fetch_sub(1, Ordering::Release);
                        released.notify_one();
                        tracing::error!("failed to dequeue {} job: {}", kind, e);
                        tokio::time::sleep(config.poll_interval).await;
                    }
                }
            }
        })
    }
}

/// Reserve one slot against `limit` using a CAS loop.
fn try_reserve_slot(active: &AtomicU32, limit: u32) -> bool {
    let mut current = active.load(Ordering::Acquire);
    loop {
        if current >= limit {
            return false;
        }
        match active.compare_exchange_weak(
            current,
            current + 1,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) => return true,
            Err(actual) => current = actual,
        }
    }
}

async fn process_job(
    job: QueuedJob,
    queue: Arc<dyn JobQueue>,
    trail: Option<JobTrail>,
    counters: &JobCounters,
    handler: &dyn JobHandler,
) {
    tracing::debug!("executing {} job {}", job.kind, job.id);
    let ctx = JobContext {
        queue: Arc::clone(&queue),
        job_id: job.id,
    };

    match handler.handle(&job, &ctx).await {
        Ok(()) => {
            if let Err(e) = queue.complete(job.id).await {
                tracing::error!("failed to mark job {} complete: {}", job.id, e);
                return;
            }
            counters.completed.fetch_add(1, Ordering::Relaxed);
            tracing::info!("{} job {} completed", job.kind, job.id);
            record_trail(trail.as_ref(), job.id, JobState::Complete, None).await;
        }
        Err(cause) => {
            let reason = cause.to_string();
            if let Err(e) = queue.fail(job.id, &reason).await {
                tracing::error!("failed to mark job {} failed: {}", job.id, e);
                return;
            }
            counters.failed.fetch_add(1, Ordering::Relaxed);
            tracing::warn!("{} job {} failed: {}", job.kind, job.id, reason);
            record_trail(trail.as_ref(), job.id, JobState::Failed, Some(&reason)).await;
        }
    }
}

async fn record_trail(trail: Option<&JobTrail>, id: JobId, state: JobState, reason: Option<&str>) {
    if let Some(trail) = trail {
        if let Err(e) = trail.record(id, state, reason).await {
            tracing::error!("failed to record job {} trail: {}", id, e);
        }
    }
}
