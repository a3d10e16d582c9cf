//! Tests for the tokio spawner and API adapters

use std::sync::Arc;

use campus_parking_lot::builders::LotBuilder;
use campus_parking_lot::config::ParkingConfig;
use campus_parking_lot::core::{ErrorKind, OrderStatus, PaymentMethod, Role, Spawn};
use campus_parking_lot::runtime::api::{
    cancel_order, enter_order, exit_order, pay_order, reserve_spot, PayRequest, ReserveRequest,
    SpotView,
};
use campus_parking_lot::runtime::tokio_spawner::TokioSpawner;
use campus_parking_lot::util::clock::ManualClock;
use chrono::{Duration, Utc};
use rust_decimal_macros::dec;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[test]
fn test_current_outside_runtime() {
    assert!(TokioSpawner::current().is_none());
}

#[test]
fn test_dedicated_runtime_runs_spawned_work() {
    let (runtime, spawner) = TokioSpawner::dedicated().unwrap();
    let (tx, rx) = std::sync::mpsc::channel();
    spawner.spawn(async move {
        tx.send(7_u32).unwrap();
    });
    assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap(), 7);
    drop(runtime);
}

#[tokio::test]
async fn test_api_round_trip() {
    let clock = ManualClock::new(Utc::now());
    let lot = LotBuilder::new(ParkingConfig::default())
        .clock(Arc::new(clock.clone()))
        .build()
        .unwrap();
    let admin = lot.register_user("root", Role::Admin, dec!(0)).unwrap();
    let zone = lot.add_zone(admin.id, "B", dec!(3), 0).unwrap();
    let spot = lot.add_spot(admin.id, zone.id, "B-001").unwrap();
    let user = lot.register_user("erin", Role::Visitor, dec!(1)).unwrap();
    lot.bind_vehicle(user.id, "API001", None).unwrap();

    let req: ReserveRequest = serde_json::from_str(&format!(
        r#"{{"user_id": {}, "spot_id": {}, "plate": "api001"}}"#,
        user.id.0, spot.id.0
    ))
    .unwrap();
    let view = reserve_spot(&lot, &req).unwrap();
    assert_eq!(view.plate, "API001");
    assert_eq!(view.status, OrderStatus::Reserved);

    let err = reserve_spot(&lot, &req).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.retryable);

    enter_order(&lot, &view.order_no).unwrap();
    clock.advance(Duration::minutes(30));
    let due = exit_order(&lot, &view.order_no).unwrap();
    assert_eq!(due.status, OrderStatus::PendingPayment);
    assert_eq!(due.fee, dec!(3.00));

    // The default lot has no online payment configured.
    let pay = PayRequest {
        user_id: user.id,
        order_no: view.order_no.clone(),
        method: PaymentMethod::Gateway,
    };
    let err = pay_order(&lot, &pay).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Dependency);

    let err = cancel_order(&lot, user.id, &view.order_no).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let spots: Vec<SpotView> = lot
        .spots_in_zone(zone.id)
        .unwrap()
        .into_iter()
        .map(SpotView::from)
        .collect();
    assert_eq!(spots.len(), 1);
    assert_eq!(spots[0].label, "B-001");
}
