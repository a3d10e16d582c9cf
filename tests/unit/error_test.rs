//! Tests for error types

use campus_parking_lot::core::{Entity, ErrorKind, ParkingError};
use campus_parking_lot::util::ids::{OrderNo, SpotId, ZoneId};

#[test]
fn test_spot_taken_error() {
    let err = ParkingError::SpotTaken(SpotId(101));
    assert_eq!(format!("{}", err), "spot S101 is already taken");
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_vehicle_busy_error() {
    let err = ParkingError::VehicleBusy("ABC123".to_string());
    assert_eq!(format!("{}", err), "vehicle ABC123 already has an active order");
    assert!(err.is_retryable());
}

#[test]
fn test_admission_denied_error() {
    let err = ParkingError::AdmissionDenied("trust score 60 is below the minimum of 70".into());
    assert_eq!(err.kind(), ErrorKind::PolicyDenied);
    assert!(!err.is_retryable());
}

#[test]
fn test_not_found_error() {
    let err = ParkingError::not_found(Entity::Zone, ZoneId(3));
    assert_eq!(format!("{}", err), "zone Z3 not found");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_dependency_errors() {
    assert_eq!(ParkingError::Gateway("timeout".into()).kind(), ErrorKind::Dependency);
    assert_eq!(ParkingError::Storage("io".into()).kind(), ErrorKind::Dependency);
}

#[test]
fn test_zone_full_error() {
    let err = ParkingError::ZoneFull(ZoneId(2));
    assert_eq!(format!("{}", err), "zone Z2 has no free spot");
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_refund_in_progress_is_retryable_conflict() {
    let err = ParkingError::RefundInProgress(OrderNo::from("ORD-7"));
    assert_eq!(format!("{}", err), "order ORD-7 has a refund in progress");
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(err.is_retryable());
}

#[test]
fn test_error_kind_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorKind::PolicyDenied).unwrap();
    assert_eq!(json, "\"policy_denied\"");
}
