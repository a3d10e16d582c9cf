//! Tokio broadcast notifier feeding push channels (e.g. a WebSocket hub).

use tokio::sync::broadcast;

use crate::core::notifier::{Notifier, ParkingEvent};

/// Message delivered to subscribers.
#[derive(Debug, Clone)]
pub struct TopicMessage {
    /// Topic name.
    pub topic: String,
    /// JSON-encoded event.
    pub payload: String,
}

/// Fan-out notifier over a bounded broadcast channel.
///
/// Slow subscribers lag and lose messages; publishing never blocks.
#[derive(Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<TopicMessage>,
}

impl BroadcastNotifier {
    /// Create a notifier buffering up to `capacity` messages per subscriber.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Attach a new listener.
    pub fn subscribe(&self) -> broadcast::Receiver<TopicMessage> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, topic: &str, event: &ParkingEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!("failed to encode {} event: {}", topic, e);
                return;
            }
        };
        if self
            .tx
            .send(TopicMessage {
                topic: topic.to_owned(),
                payload,
            })
            .is_err()
        {
            tracing::trace!("no subscribers for {}", topic);
        }
    }
}
