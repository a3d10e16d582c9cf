//! Payment gateway adapters.

pub mod mock;

pub use mock::{GatewayCall, MockGateway};
