//! Notifier sinks.

#[cfg(feature = "tokio-runtime")]
pub mod broadcast;
pub mod memory;

#[cfg(feature = "tokio-runtime")]
pub use broadcast::{BroadcastNotifier, TopicMessage};
pub use memory::{InMemoryNotifier, Published};
