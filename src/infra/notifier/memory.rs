//! In-memory notifier sink.

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::notifier::{Notifier, ParkingEvent};

/// Published event together with its topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Topic the event was published on.
    pub topic: String,
    /// Event payload.
    pub event: ParkingEvent,
}

/// In-memory notifier for testing and dev, keeping the most recent events.
pub struct InMemoryNotifier {
    events: Mutex<VecDeque<Published>>,
    max_events: usize,
}

impl InMemoryNotifier {
    /// Create a new in-memory sink with a bounded buffer.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    pub fn events(&self) -> Vec<Published> {
        self.events.lock().iter().cloned().collect()
    }

    /// Events published on `topic`, oldest first.
    pub fn events_on(&self, topic: &str) -> Vec<ParkingEvent> {
        self.events
            .lock()
            .iter()
            .filter(|p| p.topic == topic)
            .map(|p| p.event.clone())
            .collect()
    }

    /// Drop all buffered events.
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl Notifier for InMemoryNotifier {
    fn publish(&self, topic: &str, event: &ParkingEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(Published {
            topic: topic.to_owned(),
            event: event.clone(),
        });
    }
}
