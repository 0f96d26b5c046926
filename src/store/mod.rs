//! Counter store backends.

pub mod memory;
pub mod redis;

pub use memory::InMemoryStore;
pub use redis::RedisStore;

use std::collections::HashMap;

use async_trait::async_trait;

use crate::core::EngineError;

/// Key/value contract over committed-consumption counters and multi-field
/// hash records.
///
/// There is deliberately no blind increment: commits go through
/// [`CounterStore::compare_and_swap`], which closes the lost-update window a
/// bare read-compute-write cycle would leave open between concurrent writers.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Read a counter; absent keys read as 0.
    async fn read(&self, key: &str) -> Result<i64, EngineError>;

    /// Write a counter unconditionally.
    async fn write(&self, key: &str, value: i64) -> Result<(), EngineError>;

    /// Atomically replace `expected` with `new`; returns false when the
    /// current value no longer matches `expected`.
    async fn compare_and_swap(
        &self,
        key: &str,
        expected: i64,
        new: i64,
    ) -> Result<bool, EngineError>;

    /// Write one field of a multi-field hash record.
    async fn hash_write(&self, key: &str, field: &str, value: &str) -> Result<(), EngineError>;

    /// Read a whole hash record; absent keys read as an empty mapping.
    async fn hash_read_all(&self, key: &str) -> Result<HashMap<String, String>, EngineError>;
}
