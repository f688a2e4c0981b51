//! Subscriber channel.
//!
//! Pushes counter snapshots to every open view. Delivery is best-effort: a
//! bus with no receivers drops the message, and a slow receiver lags instead
//! of blocking the sender.

use bytewatch_core::UsageCounters;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::trace;

/// Buffered messages per receiver before it starts lagging.
pub const DEFAULT_BUS_CAPACITY: usize = 64;

/// Push message to subscribers.
///
/// Serialized as `{"type":"usageUpdate","data":{...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Counters changed.
    UsageUpdate {
        /// The new snapshot.
        data: UsageCounters,
    },
}

/// Request from a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Request {
    /// Liveness probe.
    Ping,
}

/// Reply to a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Response {
    /// Answer to [`Request::Ping`].
    Pong,
}

/// Answers a subscriber request.
pub fn respond(request: Request) -> Response {
    match request {
        Request::Ping => Response::Pong,
    }
}

/// Broadcast channel for [`Message`]s. Clones share the channel.
#[derive(Debug, Clone)]
pub struct MessageBus {
    tx: broadcast::Sender<Message>,
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new(DEFAULT_BUS_CAPACITY)
    }
}

impl MessageBus {
    /// Creates a bus buffering `capacity` messages per receiver.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Opens a new receiver. It sees only messages sent after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Message> {
        self.tx.subscribe()
    }

    /// Sends a message to every receiver. Returns how many got it.
    pub fn publish(&self, message: Message) -> usize {
        match self.tx.send(message) {
            Ok(receivers) => receivers,
            Err(_) => {
                trace!("No subscribers, update dropped");
                0
            }
        }
    }

    /// Publishes a counter snapshot.
    pub fn publish_usage(&self, counters: UsageCounters) -> usize {
        self.publish(Message::UsageUpdate { data: counters })
    }
}
