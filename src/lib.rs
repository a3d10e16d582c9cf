//! # Campus Parking Lot
//!
//! Concurrency-safe spot allocation for a campus car park, combined with a
//! time-driven order lifecycle and a policy-driven fee engine.
//!
//! Users reserve a spot for one of their vehicles, the vehicle enters and
//! leaves, and the fee for the stay is settled from a prepaid balance or
//! through an external payment gateway. A background sweeper turns no-show
//! reservations and unpaid fees into violations and penalizes the owner's
//! trust score.
//!
//! ## Core Guarantees
//!
//! - **One claim per spot**: under any number of concurrent reservations for
//!   the same free spot exactly one wins; the rest get `SpotTaken`
//! - **One active order per plate**: a vehicle never holds two reservations
//! - **Exactly-once transitions**: every order write is compare-and-set on the
//!   order's version, so racing transitions (including the sweeper) cannot
//!   both apply
//! - **Atomic changesets**: order, spot and ledger writes of one transition
//!   land together or not at all
//! - **Balance never negative**: debits that would overdraw are rejected
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use campus_parking_lot::builders::LotBuilder;
//! use campus_parking_lot::config::ParkingConfig;
//! use campus_parking_lot::core::{Role, TimeoutSweeper};
//! use campus_parking_lot::runtime::TokioSpawner;
//! use rust_decimal_macros::dec;
//!
//! let lot = Arc::new(LotBuilder::new(ParkingConfig::default()).build()?);
//! let admin = lot.register_user("root", Role::Admin, dec!(0))?;
//! let zone = lot.add_zone(admin.id, "A", dec!(5), 15)?;
//! let spot = lot.add_spot(admin.id, zone.id, "A-001")?;
//! let user = lot.register_user("alice", Role::Student, dec!(50))?;
//! lot.bind_vehicle(user.id, "ABC123", None)?;
//!
//! let order = lot.reserve(user.id, spot.id, "ABC123")?;
//! lot.enter(&order.no)?;
//! let order = lot.exit(&order.no)?;
//!
//! let sweeper = TimeoutSweeper::new(Arc::clone(&lot))
//!     .spawn(&TokioSpawner::current().expect("inside a tokio runtime"));
//! ```
//!
//! For complete flows, see `tests/lifecycle_test.rs` and
//! `tests/allocation_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Parking domain: records, fee engine, allocator, lifecycle and sweeper.
pub mod core;
/// Lot configuration and the live fee-policy store.
pub mod config;
/// Builders to construct a lot from configuration.
pub mod builders;
/// Infrastructure adapters for storage, notification and payment.
pub mod infra;
/// Runtime adapters and API surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
