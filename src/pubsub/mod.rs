//! Notification fan-out over broadcast channels.

pub mod memory;
pub mod redis;

pub use memory::InMemoryBroadcast;
pub use redis::RedisBroadcast;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

use crate::core::EngineError;

/// Reserved message value signalling voluntary listener shutdown.
///
/// This is an application-level convention layered on the transport, not
/// protocol-level cancellation: a listener compares every received message
/// against this exact value, unsubscribes on match, then terminates.
pub const KILL_SENTINEL: &str = "KILL_SERVER";

/// Default broadcast channel name, following the `<namespace>channel`
/// convention.
pub const DEFAULT_CHANNEL: &str = "turnstilechannel";

/// Broadcast transport: publishers fan messages out to all current
/// subscribers of a channel, ordered per publisher, with no delivery
/// guarantee to listeners that (dis)connect concurrently.
#[async_trait]
pub trait Broadcast: Send + Sync {
    /// Deliver `message` to all current subscribers of `channel`; returns
    /// the number of receivers.
    async fn publish(&self, channel: &str, message: &str) -> Result<usize, EngineError>;

    /// Register a listener receiving all subsequent messages on `channel`.
    async fn subscribe(&self, channel: &str) -> Result<Subscription, EngineError>;
}

/// A live subscription delivering messages in publish order.
pub struct Subscription {
    rx: mpsc::Receiver<String>,
    stop: Option<oneshot::Sender<()>>,
}

impl Subscription {
    pub(crate) fn new(rx: mpsc::Receiver<String>, stop: oneshot::Sender<()>) -> Self {
        Self {
            rx,
            stop: Some(stop),
        }
    }

    /// Receive the next message; `None` once the channel is gone.
    pub async fn next_message(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Unsubscribe, detaching the transport-side listener.
    pub fn unsubscribe(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

/// Drain a subscription until the kill sentinel.
///
/// Every received message is logged and collected (the sentinel included);
/// on the sentinel the listener unsubscribes and returns what it observed,
/// in delivery order.
pub async fn run_listener(mut subscription: Subscription) -> Vec<String> {
    let mut seen = Vec::new();
    while let Some(message) = subscription.next_message().await {
        tracing::info!("{}", message);
        let is_kill = message == KILL_SENTINEL;
        seen.push(message);
        if is_kill {
            subscription.unsubscribe();
            break;
        }
    }
    seen
}
