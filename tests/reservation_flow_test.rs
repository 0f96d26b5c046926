//! End-to-end reservation flow over in-memory backends: enqueue, drain,
//! commit, and observe availability and the admission gate.

use std::sync::Arc;
use std::time::Duration;

use turnstile::core::{
    available_units, JobKind, JobPayload, JobState, NotificationPayload, ResourcePool,
    SEAT_POOL_KEY,
};
use turnstile::queue::{InMemoryJobQueue, JobQueue};
use turnstile::store::{CounterStore, InMemoryStore};
use turnstile::worker::{
    DrainConfig, JobTrail, NotificationHandler, SeatReservationHandler, WorkerPool,
};
use turnstile::core::AdmissionGate;

const POLL: Duration = Duration::from_millis(5);

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

struct SeatRig {
    store: Arc<InMemoryStore>,
    queue: Arc<InMemoryJobQueue>,
    gate: Arc<AdmissionGate>,
    pool: ResourcePool,
    workers: WorkerPool,
}

fn seat_rig(capacity: u32) -> SeatRig {
    let store = Arc::new(InMemoryStore::new());
    let queue = Arc::new(InMemoryJobQueue::new(1024));
    let gate = Arc::new(AdmissionGate::new());
    let pool = ResourcePool {
        key: SEAT_POOL_KEY.to_owned(),
        capacity,
    };
    let workers = WorkerPool::new(Arc::clone(&queue) as Arc<dyn JobQueue>);
    SeatRig {
        store,
        queue,
        gate,
        pool,
        workers,
    }
}

impl SeatRig {
    fn start_drain(&self) {
        let handler = SeatReservationHandler::new(
            Arc::clone(&self.store) as Arc<dyn CounterStore>,
            self.pool.clone(),
            Arc::clone(&self.gate),
        );
        self.workers.drain(
            JobKind::ReserveSeat,
            DrainConfig {
                concurrency: 1,
                poll_interval: POLL,
            },
            Arc::new(handler),
        );
    }
}

#[tokio::test]
async fn test_sequential_commits_drain_availability_to_zero() {
    let rig = seat_rig(5);
    for _ in 0..5 {
        rig.queue
            .enqueue(JobKind::ReserveSeat, JobPayload::Seat)
            .await
            .unwrap();
    }
    rig.start_drain();

    let counters = rig.workers.counters();
    wait_until(|| counters.settled() == 5).await;

    assert_eq!(counters.snapshot().completed, 5);
    assert_eq!(rig.store.read(SEAT_POOL_KEY).await.unwrap(), 5);
    assert_eq!(
        available_units(rig.store.as_ref(), &rig.pool).await.unwrap(),
        0
    );
    // Exhaustion flipped the gate closed, and it stays closed.
    assert!(!rig.gate.is_open());

    for id in 1..=5 {
        let record = rig.queue.job(id).await.unwrap().unwrap();
        assert_eq!(record.state, JobState::Complete);
        assert_eq!(record.progress, 100);
    }
}

#[tokio::test]
async fn test_jobs_past_capacity_fail_without_overcommit() {
    let rig = seat_rig(2);
    for _ in 0..4 {
        rig.queue
            .enqueue(JobKind::ReserveSeat, JobPayload::Seat)
            .await
            .unwrap();
    }
    rig.start_drain();

    let counters = rig.workers.counters();
    wait_until(|| counters.settled() == 4).await;

    let snapshot = counters.snapshot();
    assert_eq!(snapshot.completed, 2);
    assert_eq!(snapshot.failed, 2);
    // The committed counter was never pushed past capacity.
    assert_eq!(rig.store.read(SEAT_POOL_KEY).await.unwrap(), 2);
    assert!(!rig.gate.is_open());

    let failed = rig.queue.job(3).await.unwrap().unwrap();
    assert_eq!(failed.state, JobState::Failed);
    assert_eq!(failed.failure.as_deref(), Some("not enough seats available"));
}

#[tokio::test]
async fn test_blacklisted_job_fails_with_no_counter_mutation() {
    let store = Arc::new(InMemoryStore::new());
    let queue = Arc::new(InMemoryJobQueue::new(1024));
    let workers = WorkerPool::new(Arc::clone(&queue) as Arc<dyn JobQueue>)
        .with_trail(JobTrail::new(Arc::clone(&store) as Arc<dyn CounterStore>));

    let blacklisted = queue
        .enqueue(
            JobKind::PushNotification,
            JobPayload::Notification(NotificationPayload {
                phone_number: "4153518780".into(),
                message: "This is the code 1234 to verify your account".into(),
            }),
        )
        .await
        .unwrap();
    let clean = queue
        .enqueue(
            JobKind::PushNotification,
            JobPayload::Notification(NotificationPayload {
                phone_number: "4153518743".into(),
                message: "This is the code 4321 to verify your account".into(),
            }),
        )
        .await
        .unwrap();

    let handler = NotificationHandler::new(["4153518780".to_owned(), "4153518781".to_owned()]);
    workers.drain(
        JobKind::PushNotification,
        DrainConfig {
            concurrency: 2,
            poll_interval: POLL,
        },
        Arc::new(handler),
    );

    let counters = workers.counters();
    wait_until(|| counters.settled() == 2).await;

    let rejected = queue.job(blacklisted).await.unwrap().unwrap();
    assert_eq!(rejected.state, JobState::Failed);
    assert_eq!(
        rejected.failure.as_deref(),
        Some("phone number 4153518780 is blacklisted")
    );
    let delivered = queue.job(clean).await.unwrap().unwrap();
    assert_eq!(delivered.state, JobState::Complete);

    // Notification jobs touch no shared counter.
    assert_eq!(store.read(SEAT_POOL_KEY).await.unwrap(), 0);

    // Terminal outcomes were persisted to the trail through the store.
    let trail = JobTrail::new(Arc::clone(&store) as Arc<dyn CounterStore>);
    let fields = trail.fetch(blacklisted).await.unwrap();
    assert_eq!(fields.get("state").map(String::as_str), Some("failed"));
}
