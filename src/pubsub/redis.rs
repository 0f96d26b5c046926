//! Redis-backed broadcast transport.

use async_trait::async_trait;
use futures::StreamExt;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::{mpsc, oneshot};

use crate::core::EngineError;
use crate::pubsub::{Broadcast, Subscription};
use crate::store::redis::store_err;

const FORWARD_CAPACITY: usize = 256;

/// Broadcast fan-out over Redis PUBLISH/SUBSCRIBE.
///
/// Publishing rides the shared connection manager; each subscription holds
/// its own pub/sub connection, as the protocol requires.
pub struct RedisBroadcast {
    client: redis::Client,
    conn: ConnectionManager,
}

impl RedisBroadcast {
    /// Connect the publishing side at `url`.
    ///
    /// # Errors
    ///
    /// `StoreUnavailable` when the URL is malformed or the initial
    /// connection cannot be established.
    pub async fn connect(url: &str) -> Result<Self, EngineError> {
        let client = redis::Client::open(url).map_err(store_err)?;
        let conn = ConnectionManager::new(client.clone()).await.map_err(store_err)?;
        Ok(Self { client, conn })
    }
}

#[async_trait]
impl Broadcast for RedisBroadcast {
    async fn publish(&self, channel: &str, message: &str) -> Result<usize, EngineError> {
        let mut conn = self.conn.clone();
        let receivers: i64 = conn.publish(channel, message).await.map_err(store_err)?;
        Ok(usize::try_from(receivers).unwrap_or(0))
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, EngineError> {
        let mut pubsub = self.client.get_async_pubsub().await.map_err(store_err)?;
        pubsub.subscribe(channel).await.map_err(store_err)?;

        let channel = channel.to_owned();
        let (out_tx, out_rx) = mpsc::channel(FORWARD_CAPACITY);
        let (stop_tx, mut stop_rx) = oneshot::channel();

        tokio::spawn(async move {
            {
                let mut messages = pubsub.on_message();
                loop {
                    tokio::select! {
                        _ = &mut stop_rx => break,
                        received = messages.next() => {
                            let Some(msg) = received else { break };
                            match msg.get_payload::<String>() {
                                Ok(payload) => {
                                    if out_tx.send(payload).await.is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("undecodable pub/sub payload: {}", e);
                                }
                            }
                        },
                    }
                }
            }
            if let Err(e) = pubsub.unsubscribe(&channel).await {
                tracing::debug!("unsubscribe from {} failed: {}", channel, e);
            }
        });

        Ok(Subscription::new(out_rx, stop_tx))
    }
}
