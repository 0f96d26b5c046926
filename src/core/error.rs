//! Error types for reservation engine operations.

use thiserror::Error;

/// Errors produced by engine components.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Backing store connection or command failure.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),
    /// Unknown resource or item key.
    #[error("not found: {0}")]
    NotFound(String),
    /// Resource pool has no remaining units to commit.
    #[error("not enough {0} available")]
    CapacityExhausted(String),
    /// Payload rejected by a domain guard.
    #[error("phone number {0} is blacklisted")]
    Blacklisted(String),
    /// Malformed input rejected before anything is enqueued.
    #[error("{0}")]
    Validation(String),
    /// Queue is full for the target job kind.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
