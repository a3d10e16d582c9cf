//! Configuration models for admission policy, timeouts and fees.

pub mod policy;

pub use policy::{FeePolicy, ParkingConfig, PolicyStore, RoleDiscounts};
