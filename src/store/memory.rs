//! In-memory counter store for development and testing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::EngineError;
use crate::store::CounterStore;

/// Process-local counter store. Never fails; the mutex makes
/// compare-and-swap genuinely atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    counters: Mutex<HashMap<String, i64>>,
    hashes: Mutex<HashMap<String, HashMap<String, String>>>,
}

impl InMemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CounterStore for InMemoryStore {
    async fn read(&self, key: &str) -> Result<i64, EngineError> {
        Ok(self.counters.lock().get(key).copied().unwrap_or(0))
    }

    async fn write(&self, key: &str, value: i64) -> Result<(), EngineError> {
        self.counters.lock().insert(key.to_owned(), value);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: i64,
        new: i64,
    ) -> Result<bool, EngineError> {
        let mut counters = self.counters.lock();
        let current = counters.get(key).copied().unwrap_or(0);
        if current != expected {
            return Ok(false);
        }
        counters.insert(key.to_owned(), new);
        Ok(true)
    }

    async fn hash_write(&self, key: &str, field: &str, value: &str) -> Result<(), EngineError> {
        self.hashes
            .lock()
            .entry(key.to_owned())
            .or_default()
            .insert(field.to_owned(), value.to_owned());
        Ok(())
    }

    async fn hash_read_all(&self, key: &str) -> Result<HashMap<String, String>, EngineError> {
        Ok(self.hashes.lock().get(key).cloned().unwrap_or_default())
    }
}
