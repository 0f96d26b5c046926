//! Redis-backed counter store.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Script};

use crate::core::EngineError;
use crate::store::CounterStore;

/// Compare-and-swap over GET/SET, made atomic server-side. Absent keys
/// compare as "0" to match the store's default-zero read contract.
const CAS_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[1])
if current == false then current = '0' end
if current == ARGV[1] then
  redis.call('SET', KEYS[1], ARGV[2])
  return 1
end
return 0
";

/// Counter store over a multiplexed Redis connection.
///
/// The connection manager reconnects transparently; command failures surface
/// as [`EngineError::StoreUnavailable`] for callers to log and convert.
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
    cas: Script,
}

impl RedisStore {
    /// Connect to the counter store at `url` (e.g. `redis://127.0.0.1:6379`).
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` when the URL is malformed or the initial
    /// connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, EngineError> {
        let client = redis::Client::open(url).map_err(store_err)?;
        let conn = ConnectionManager::new(client).await.map_err(store_err)?;
        Ok(Self {
            conn,
            cas: Script::new(CAS_SCRIPT),
        })
    }

    /// Build a store from an existing connection manager.
    #[must_use]
    pub fn from_manager(conn: ConnectionManager) -> Self {
        Self {
            conn,
            cas: Script::new(CAS_SCRIPT),
        }
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn read(&self, key: &str) -> Result<i64, EngineError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await.map_err(store_err)?;
        match value {
            None => Ok(0),
            Some(raw) => raw.trim().parse().map_err(|e| {
                EngineError::Backend(format!("non-numeric counter at {key}: {e}"))
            }),
        }
    }

    async fn write(&self, key: &str, value: i64) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await.map_err(store_err)?;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: i64,
        new: i64,
    ) -> Result<bool, EngineError> {
        let mut conn = self.conn.clone();
        let applied: i64 = self
            .cas
            .key(key)
            .arg(expected)
            .arg(new)
            .invoke_async(&mut conn)
            .await
            .map_err(store_err)?;
        Ok(applied == 1)
    }

    async fn hash_write(&self, key: &str, field: &str, value: &str) -> Result<(), EngineError> {
        let mut conn = self.conn.clone();
        let _: () = conn.hset(key, field, value).await.map_err(store_err)?;
        Ok(())
    }

    async fn hash_read_all(&self, key: &str) -> Result<HashMap<String, String>, EngineError> {
        let mut conn = self.conn.clone();
        conn.hgetall(key).await.map_err(store_err)
    }
}

pub(crate) fn store_err(e: redis::RedisError) -> EngineError {
    EngineError::StoreUnavailable(e.to_string())
}
