//! Tests for the fee engine

use campus_parking_lot::config::FeePolicy;
use campus_parking_lot::core::{billable_hours, compute_fee, fee_for_stay, ParkingError, Role, Zone};
use campus_parking_lot::util::ids::ZoneId;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::Rng;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap() + Duration::minutes(minutes)
}

#[test]
fn test_scenario_ninety_minutes() {
    let fee = compute_fee(at(5), at(95), dec!(5), 0, dec!(1.0), dec!(1.0)).unwrap();
    assert_eq!(fee, dec!(10.00));
}

#[test]
fn test_zero_length_stay_is_free() {
    let fee = compute_fee(at(0), at(0), dec!(8), 0, dec!(1), dec!(1)).unwrap();
    assert_eq!(fee, Decimal::ZERO);
}

#[test]
fn test_exit_before_entry_rejected() {
    let err = compute_fee(at(10), at(5), dec!(5), 0, dec!(1), dec!(1)).unwrap_err();
    assert_eq!(err, ParkingError::InvalidInterval);
}

#[test]
fn test_started_hours_round_up() {
    assert_eq!(billable_hours(at(0), at(1), 0).unwrap(), 1);
    assert_eq!(billable_hours(at(0), at(60), 0).unwrap(), 1);
    assert_eq!(billable_hours(at(0), at(61), 0).unwrap(), 2);
}

#[test]
fn test_free_minutes_subtracted_before_ceiling() {
    assert_eq!(billable_hours(at(0), at(15), 15).unwrap(), 0);
    assert_eq!(billable_hours(at(0), at(75), 15).unwrap(), 1);
    assert_eq!(billable_hours(at(0), at(76), 15).unwrap(), 2);
}

#[test]
fn test_free_time_switch() {
    let zone = Zone {
        id: ZoneId(1),
        name: "A".into(),
        hourly_rate: dec!(4),
        free_minutes: 30,
    };
    let mut policy = FeePolicy::default();
    assert_eq!(
        fee_for_stay(&zone, Role::Visitor, &policy, at(0), at(20)).unwrap(),
        dec!(0)
    );
    policy.apply_free_time = false;
    assert_eq!(
        fee_for_stay(&zone, Role::Visitor, &policy, at(0), at(20)).unwrap(),
        dec!(4)
    );
    assert_eq!(
        fee_for_stay(&zone, Role::Staff, &policy, at(0), at(20)).unwrap(),
        dec!(2)
    );
}

#[test]
fn test_half_up_rounding() {
    // 1 h * 0.25 * 0.1 = 0.025 -> 0.03
    let fee = compute_fee(at(0), at(30), dec!(0.25), 0, dec!(0.1), dec!(1)).unwrap();
    assert_eq!(fee, dec!(0.03));
}

#[test]
fn test_negative_rate_rejected() {
    let err = compute_fee(at(0), at(30), dec!(-1), 0, dec!(1), dec!(1)).unwrap_err();
    assert!(matches!(err, ParkingError::Validation(_)));
}

#[test]
fn test_fee_is_deterministic_and_monotonic() {
    let mut rng = rand::rng();
    for _ in 0..200 {
        let rate = Decimal::new(rng.random_range(0..2_000), 2);
        let free = rng.random_range(0..90);
        let discount = Decimal::new(rng.random_range(0..=100), 2);
        let multiplier = Decimal::new(rng.random_range(50..=300), 2);
        let shorter = rng.random_range(0..1_000);
        let longer = shorter + rng.random_range(0..1_000);

        let a = compute_fee(at(0), at(shorter), rate, free, discount, multiplier).unwrap();
        let b = compute_fee(at(0), at(shorter), rate, free, discount, multiplier).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), b.to_string());

        let c = compute_fee(at(0), at(longer), rate, free, discount, multiplier).unwrap();
        assert!(c >= a, "fee decreased from {a} to {c} ({shorter} -> {longer} min)");
    }
}
