//! Store-backed job trail: terminal outcomes as multi-field hash records.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{EngineError, JobId, JobState};
use crate::store::CounterStore;
use crate::util::clock::now_ms;

/// Persists terminal job outcomes under `job.<id>` hash records so they
/// survive the in-process queue and can be inspected out of band.
#[derive(Clone)]
pub struct JobTrail {
    store: Arc<dyn CounterStore>,
}

impl JobTrail {
    /// Build a trail over a counter store.
    #[must_use]
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Record a terminal state (and failure cause, if any) for a job.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn record(
        &self,
        id: JobId,
        state: JobState,
        reason: Option<&str>,
    ) -> Result<(), EngineError> {
        let key = format!("job.{id}");
        self.store.hash_write(&key, "state", state.as_str()).await?;
        self.store
            .hash_write(&key, "settled_at_ms", &now_ms().to_string())
            .await?;
        if let Some(reason) = reason {
            self.store.hash_write(&key, "failure", reason).await?;
        }
        Ok(())
    }

    /// Fetch the recorded fields for a job; empty when never recorded.
    ///
    /// # Errors
    ///
    /// Propagates store failures.
    pub async fn fetch(&self, id: JobId) -> Result<HashMap<String, String>, EngineError> {
        self.store.hash_read_all(&format!("job.{id}")).await
    }
}
