//! Tests for builder modules

use std::sync::Arc;

use campus_parking_lot::builders::{build_lot, LotBuilder};
use campus_parking_lot::config::ParkingConfig;
use campus_parking_lot::core::{DisabledGateway, NullNotifier, ParkingError, Role};
use campus_parking_lot::infra::store::InMemoryStore;
use campus_parking_lot::util::clock::SystemClock;
use rust_decimal_macros::dec;

#[test]
fn test_build_lot_with_explicit_collaborators() {
    let lot = build_lot(
        ParkingConfig::default(),
        Arc::new(InMemoryStore::new()),
        Arc::new(NullNotifier),
        Arc::new(DisabledGateway),
        Arc::new(SystemClock),
    )
    .unwrap();
    let user = lot.register_user("frank", Role::Staff, dec!(5)).unwrap();
    assert_eq!(lot.user(user.id).unwrap().trust_score, 100);
}

#[test]
fn test_builder_rejects_invalid_config() {
    let config = ParkingConfig {
        max_vehicles_per_user: 0,
        ..ParkingConfig::default()
    };
    let err = LotBuilder::new(config).build().unwrap_err();
    assert!(matches!(err, ParkingError::Validation(_)));
}

#[test]
fn test_builder_seeds_fee_policy() {
    let mut config = ParkingConfig::default();
    config.fee.multiplier = dec!(1.25);
    let lot = LotBuilder::new(config).build().unwrap();
    assert_eq!(lot.policy().snapshot().multiplier, dec!(1.25));
}
