//! In-process broadcast transport for development and testing.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::core::EngineError;
use crate::pubsub::{Broadcast, Subscription};

const CHANNEL_CAPACITY: usize = 256;

/// Broadcast fan-out over per-channel `tokio::sync::broadcast` senders.
#[derive(Debug, Default)]
pub struct InMemoryBroadcast {
    channels: Mutex<HashMap<String, broadcast::Sender<String>>>,
}

impl InMemoryBroadcast {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<String> {
        self.channels
            .lock()
            .entry(channel.to_owned())
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }
}

#[async_trait]
impl Broadcast for InMemoryBroadcast {
    async fn publish(&self, channel: &str, message: &str) -> Result<usize, EngineError> {
        let tx = {
            let channels = self.channels.lock();
            channels.get(channel).cloned()
        };
        // A channel nobody has subscribed to drops the message, as the
        // transport promises nothing to absent listeners.
        Ok(tx.map_or(0, |tx| tx.send(message.to_owned()).unwrap_or(0)))
    }

    async fn subscribe(&self, channel: &str) -> Result<Subscription, EngineError> {
        let mut rx = self.sender(channel).subscribe();
        let (out_tx, out_rx) = mpsc::channel(CHANNEL_CAPACITY);
        let (stop_tx, mut stop_rx) = oneshot::channel();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    received = rx.recv() => match received {
                        Ok(message) => {
                            if out_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(missed)) => {
                            tracing::warn!("subscriber lagged, {} messages dropped", missed);
                        }
                        Err(broadcast::error::RecvError::Closed) => break,
                    },
                }
            }
        });

        Ok(Subscription::new(out_rx, stop_tx))
    }
}
