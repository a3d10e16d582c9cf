//! Infrastructure adapters: storage, notification sinks and payment gateways.

pub mod gateway;
pub mod notifier;
pub mod store;
