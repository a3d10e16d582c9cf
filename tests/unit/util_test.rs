//! Tests for utility functions

use campus_parking_lot::util::{init_tracing, Clock, ManualClock, OrderNo, SpotId, UserId, ZoneId};
use chrono::{Duration, TimeZone, Utc};

#[test]
fn test_id_display() {
    assert_eq!(UserId(7).to_string(), "U7");
    assert_eq!(ZoneId(2).to_string(), "Z2");
    assert_eq!(SpotId(101).to_string(), "S101");
}

#[test]
fn test_ids_serialize_transparently() {
    assert_eq!(serde_json::to_string(&SpotId(5)).unwrap(), "5");
    let no: OrderNo = serde_json::from_str("\"ORD-1\"").unwrap();
    assert_eq!(no.as_str(), "ORD-1");
}

#[test]
fn test_manual_clock_shared_between_clones() {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let clock = ManualClock::new(start);
    let view = clock.clone();
    clock.advance(Duration::minutes(90));
    assert_eq!(view.now(), start + Duration::minutes(90));
    clock.set(start);
    assert_eq!(view.now(), start);
}

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
}
