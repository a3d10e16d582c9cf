//! Tests for configuration validation

use campus_parking_lot::config::{FeePolicy, ParkingConfig, PolicyStore, RoleDiscounts};
use campus_parking_lot::core::Role;
use rust_decimal_macros::dec;

#[test]
fn test_default_config_values() {
    let cfg = ParkingConfig::default();
    assert_eq!(cfg.min_trust_score, 80);
    assert_eq!(cfg.perfect_trust_score, 100);
    assert_eq!(cfg.reservation_timeout_minutes, 30);
    assert_eq!(cfg.payment_timeout_hours, 24);
    assert_eq!(cfg.sweep_interval_secs, 60);
    assert_eq!(cfg.reservation_penalty, 10);
    assert_eq!(cfg.payment_penalty, 5);
    assert_eq!(cfg.violation_fee, dec!(5.00));
    assert_eq!(cfg.max_vehicles_per_user, 3);
    assert!(cfg.block_unpaid_orders);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_config_from_json_partial() {
    let cfg = ParkingConfig::from_json_str(
        r#"{
            "min_trust_score": 70,
            "reservation_timeout_minutes": 15,
            "fee": { "multiplier": 1.5, "apply_free_time": false }
        }"#,
    )
    .unwrap();
    assert_eq!(cfg.min_trust_score, 70);
    assert_eq!(cfg.reservation_timeout_minutes, 15);
    assert_eq!(cfg.payment_timeout_hours, 24);
    assert_eq!(cfg.fee.multiplier, dec!(1.5));
    assert!(!cfg.fee.apply_free_time);
    assert_eq!(cfg.fee.discounts, RoleDiscounts::default());
}

#[test]
fn test_config_invalid_trust() {
    let err = ParkingConfig::from_json_str(r#"{ "min_trust_score": 101 }"#).unwrap_err();
    assert!(err.contains("min_trust_score"));
}

#[test]
fn test_config_invalid_timeout() {
    let cfg = ParkingConfig {
        reservation_timeout_minutes: 0,
        ..ParkingConfig::default()
    };
    assert!(cfg.validate().is_err());
}

#[test]
fn test_config_rejects_malformed_json() {
    let err = ParkingConfig::from_json_str("{ not json").unwrap_err();
    assert!(err.starts_with("parse error"));
}

#[test]
fn test_discount_out_of_range() {
    let policy = FeePolicy {
        discounts: RoleDiscounts {
            student: dec!(1.2),
            ..RoleDiscounts::default()
        },
        ..FeePolicy::default()
    };
    assert!(policy.validate().is_err());
}

#[test]
fn test_role_discounts() {
    let discounts = RoleDiscounts::default();
    assert_eq!(discounts.for_role(Role::Visitor), dec!(1));
    assert_eq!(discounts.for_role(Role::Student), dec!(0.8));
    assert_eq!(discounts.for_role(Role::Staff), dec!(0.5));
    assert_eq!(discounts.for_role(Role::Admin), dec!(0));
}

#[test]
fn test_policy_store_shared_between_clones() {
    let store = PolicyStore::new(FeePolicy::default());
    let reader = store.clone();
    store.set_multiplier(dec!(2)).unwrap();
    assert_eq!(reader.snapshot().multiplier, dec!(2));
}
