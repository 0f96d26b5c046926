//! Redis-backed durable job queue.
//!
//! Jobs live as hash records under `{ns}:job:{id}`; per-kind FIFO lanes are
//! lists, with the reliable-queue move into an active list guaranteeing
//! single delivery while a job is being processed.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use crate::core::{EngineError, JobId, JobKind, JobPayload, JobRecord, JobState, QueuedJob};
use crate::queue::JobQueue;
use crate::store::redis::store_err;
use crate::util::clock::now_ms;

/// Durable queue over Redis lists and hashes.
#[derive(Clone)]
pub struct RedisJobQueue {
    conn: ConnectionManager,
    namespace: String,
    max_depth: usize,
}

impl RedisJobQueue {
    /// Connect to the queue's backing store at `url`.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` when the initial connection cannot be established.
    pub async fn connect(url: &str, max_depth: usize) -> Result<Self, EngineError> {
        let client = redis::Client::open(url).map_err(store_err)?;
        let conn = ConnectionManager::new(client).await.map_err(store_err)?;
        Ok(Self::from_manager(conn, max_depth))
    }

    /// Build a queue from an existing connection manager.
    #[must_use]
    pub fn from_manager(conn: ConnectionManager, max_depth: usize) -> Self {
        Self {
            conn,
            namespace: "turnstile".to_owned(),
            max_depth,
        }
    }

    fn ids_key(&self) -> String {
        format!("{}:job:ids", self.namespace)
    }

    fn job_key(&self, id: JobId) -> String {
        format!("{}:job:{id}", self.namespace)
    }

    fn ready_key(&self, kind: JobKind) -> String {
        format!("{}:ready:{kind}", self.namespace)
    }

    fn active_key(&self, kind: JobKind) -> String {
        format!("{}:active:{kind}", self.namespace)
    }

    async fn load_record(&self, id: JobId) -> Result<Option<JobRecord>, EngineError> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> =
            conn.hgetall(self.job_key(id)).await.map_err(store_err)?;
        if fields.is_empty() {
            return Ok(None);
        }
        record_from_fields(id, &fields).map(Some)
    }

    /// Load a record and require it to be active, the precondition for every
    /// worker-driven transition.
    async fn active_record(&self, id: JobId) -> Result<JobRecord, EngineError> {
        let record = self
            .load_record(id)
            .await?
            .ok_or_else(|| EngineError::Backend(format!("unknown job {id}")))?;
        if record.state != JobState::Active {
            return Err(EngineError::Backend(format!(
                "job {id} is {} and cannot transition",
                record.state
            )));
        }
        Ok(record)
    }

    async fn finish(
        &self,
        record: &JobRecord,
        state: JobState,
        failure: Option<&str>,
    ) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        let mut pipe = redis::pipe();
        pipe.hset(self.job_key(record.id), "state", state.as_str())
            .ignore();
        if state == JobState::Complete {
            pipe.hset(self.job_key(record.id), "progress", 100).ignore();
        }
        if let Some(reason) = failure {
            pipe.hset(self.job_key(record.id), "failure", reason).ignore();
        }
        pipe.lrem(self.active_key(record.kind), 1, record.id).ignore();
        let _: () = pipe.query_async(&mut conn).await.map_err(store_err)?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn enqueue(&self, kind: JobKind, payload: JobPayload) -> Result<JobId, EngineError> {
        let mut conn = self.conn.clone();
        let depth: usize = conn.llen(self.ready_key(kind)).await.map_err(store_err)?;
        if depth >= self.max_depth {
            return Err(EngineError::QueueFull(format!(
                "max queue depth {} reached for {kind}",
                self.max_depth
            )));
        }

        let id: JobId = conn.incr(self.ids_key(), 1).await.map_err(store_err)?;
        let encoded = serde_json::to_string(&payload)
            .map_err(|e| EngineError::Backend(format!("payload encode: {e}")))?;

        let mut pipe = redis::pipe();
        pipe.hset_multiple(
            self.job_key(id),
            &[
                ("kind", kind.as_str().to_owned()),
                ("state", JobState::Queued.as_str().to_owned()),
                ("progress", "0".to_owned()),
                ("payload", encoded),
                ("created_at_ms", now_ms().to_string()),
            ],
        )
        .ignore();
        pipe.lpush(self.ready_key(kind), id).ignore();
        let _: () = pipe.query_async(&mut conn).await.map_err(store_err)?;
        Ok(id)
    }

    async fn next_ready(&self, kind: JobKind) -> Result<Option<QueuedJob>, EngineError> {
        let mut conn = self.conn.clone();
        let id: Option<JobId> = conn
            .rpoplpush(self.ready_key(kind), self.active_key(kind))
            .await
            .map_err(store_err)?;
        let Some(id) = id else {
            return Ok(None);
        };
        let _: () = conn
            .hset(self.job_key(id), "state", JobState::Active.as_str())
            .await
            .map_err(store_err)?;
        let record = self
            .load_record(id)
            .await?
            .ok_or_else(|| EngineError::Backend(format!("job {id} vanished from the queue")))?;
        Ok(Some(QueuedJob {
            id,
            kind,
            payload: record.payload,
        }))
    }

    async fn report_progress(&self, id: JobId, progress: u8) -> Result<(), EngineError> {
        let record = self.active_record(id).await?;
        if progress <= record.progress {
            return Ok(());
        }
        let mut conn = self.conn.clone();
        let _: () = conn
            .hset(self.job_key(id), "progress", progress.min(100))
            .await
            .map_err(store_err)?;
        Ok(())
    }

    async fn complete(&self, id: JobId) -> Result<(), EngineError> {
        let record = self.active_record(id).await?;
        self.finish(&record, JobState::Complete, None).await
    }

    async fn fail(&self, id: JobId, reason: &str) -> Result<(), EngineError> {
        let record = self.active_record(id).await?;
        self.finish(&record, JobState::Failed, Some(reason)).await
    }

    async fn job(&self, id: JobId) -> Result<Option<JobRecord>, EngineError> {
        self.load_record(id).await
    }

    async fn pending(&self, kind: JobKind) -> Result<usize, EngineError> {
        let mut conn = self.conn.clone();
        conn.llen(self.ready_key(kind)).await.map_err(store_err)
    }
}

fn record_from_fields(
    id: JobId,
    fields: &HashMap<String, String>,
) -> Result<JobRecord, EngineError> {
    let field = |name: &str| {
        fields
            .get(name)
            .ok_or_else(|| EngineError::Backend(format!("job {id} record missing `{name}`")))
    };

    let kind = JobKind::parse(field("kind")?)
        .ok_or_else(|| EngineError::Backend(format!("job {id} has an unknown kind")))?;
    let state = JobState::parse(field("state")?)
        .ok_or_else(|| EngineError::Backend(format!("job {id} has an unknown state")))?;
    let payload: JobPayload = serde_json::from_str(field("payload")?)
        .map_err(|e| EngineError::Backend(format!("job {id} payload decode: {e}")))?;
    let progress = field("progress")?
        .parse()
        .map_err(|e| EngineError::Backend(format!("job {id} progress decode: {e}")))?;
    let created_at_ms = field("created_at_ms")?
        .parse()
        .map_err(|e| EngineError::Backend(format!("job {id} timestamp decode: {e}")))?;

    Ok(JobRecord {
        id,
        kind,
        payload,
        state,
        progress,
        failure: fields.get("failure").cloned(),
        created_at_ms,
    })
}
