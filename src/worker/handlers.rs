//! Job handlers: seat reservation commits and push notification delivery.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::{
    available_units, commit_units, AdmissionGate, EngineError, JobPayload, QueuedJob, ResourcePool,
};
use crate::store::CounterStore;
use crate::worker::{JobContext, JobHandler};

/// Commits one seat per job against the seat pool counter.
///
/// Runs at drain concurrency 1 so commits stay serial; the commit itself is
/// still compare-and-swap, so a second committer (e.g. the product endpoint
/// path sharing the store) cannot cause a lost update.
pub struct SeatReservationHandler {
    store: Arc<dyn CounterStore>,
    pool: ResourcePool,
    gate: Arc<AdmissionGate>,
}

impl SeatReservationHandler {
    /// Build a handler committing against `pool`.
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>, pool: ResourcePool, gate: Arc<AdmissionGate>) -> Self {
        Self { store, pool, gate }
    }
}

#[async_trait]
impl JobHandler for SeatReservationHandler {
    async fn handle(&self, _job: &QueuedJob, ctx: &JobContext) -> Result<(), EngineError> {
        ctx.progress(0).await?;

        let available = available_units(self.store.as_ref(), &self.pool).await?;
        if available <= 0 {
            self.gate.close();
            return Err(EngineError::CapacityExhausted("seats".to_owned()));
        }

        ctx.progress(50).await?;

        match commit_units(self.store.as_ref(), &self.pool, 1).await {
            Ok(_) => {}
            Err(e @ EngineError::CapacityExhausted(_)) => {
                self.gate.close();
                return Err(e);
            }
            Err(e) => return Err(e),
        }

        let remaining = available_units(self.store.as_ref(), &self.pool).await?;
        if remaining <= 0 {
            self.gate.close();
        }
        Ok(())
    }
}

/// Delivers push notifications, rejecting blacklisted recipients.
///
/// Touches no shared counter, so it is safe to drain at concurrency > 1.
pub struct NotificationHandler {
    blacklist: HashSet<String>,
}

impl NotificationHandler {
    /// Build a handler with the given recipient blacklist.
    #[must_use]
    pub fn new(blacklist: impl IntoIterator<Item = String>) -> Self {
        Self {
            blacklist: blacklist.into_iter().collect(),
        }
    }
}

#[async_trait]
impl JobHandler for NotificationHandler {
    async fn handle(&self, job: &QueuedJob, ctx: &JobContext) -> Result<(), EngineError> {
        let JobPayload::Notification(payload) = &job.payload else {
            return Err(EngineError::Backend(format!(
                "job {} carries no notification payload",
                job.id
            )));
        };

        ctx.progress(0).await?;

        if self.blacklist.contains(&payload.phone_number) {
            return Err(EngineError::Blacklisted(payload.phone_number.clone()));
        }

        ctx.progress(50).await?;
        tracing::info!(
            "sending notification to {}, with message: {}",
            payload.phone_number,
            payload.message
        );
        Ok(())
    }
}
