//! Tests for the in-memory store's compare-and-set commits

use std::sync::{Arc, Barrier};

use campus_parking_lot::core::{
    Changeset, Entity, Order, OrderStatus, ParkingError, ParkingStore, Role, Spot, SpotStatus,
    User, Vehicle, Zone,
};
use campus_parking_lot::infra::store::InMemoryStore;
use campus_parking_lot::util::ids::{OrderNo, SpotId, UserId, ZoneId};
use chrono::Utc;
use rust_decimal_macros::dec;

fn seeded() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store
        .put_zone(Zone {
            id: ZoneId(1),
            name: "A".into(),
            hourly_rate: dec!(5),
            free_minutes: 0,
        })
        .unwrap();
    store
        .insert_spot(Spot {
            id: SpotId(1),
            zone_id: ZoneId(1),
            label: "A-001".into(),
            status: SpotStatus::Free,
            current_plate: None,
            version: 0,
        })
        .unwrap();
    store
        .insert_user(User {
            id: UserId(1),
            name: "alice".into(),
            role: Role::Student,
            balance: dec!(100),
            trust_score: 100,
            active: true,
            created_at: Utc::now(),
        })
        .unwrap();
    store
        .insert_vehicle(
            Vehicle {
                plate: "ABC123".into(),
                owner: UserId(1),
                nickname: None,
                registered_at: Utc::now(),
            },
            3,
        )
        .unwrap();
    store
}

#[test]
fn test_racing_spot_writes_single_winner() {
    const WRITERS: usize = 12;
    let store = seeded();
    let read = store.spot(SpotId(1)).unwrap();
    let barrier = Arc::new(Barrier::new(WRITERS));

    let handles: Vec<_> = (0..WRITERS)
        .map(|i| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            let mut claim = read.clone();
            std::thread::spawn(move || {
                claim.status = SpotStatus::Reserved;
                claim.current_plate = Some(format!("P{i}"));
                barrier.wait();
                store.commit(Changeset::new().update_spot(claim))
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for err in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(err, ParkingError::StaleRecord { entity: Entity::Spot, .. }));
    }
    assert_eq!(store.spot(SpotId(1)).unwrap().version, 1);
}

#[test]
fn test_concurrent_ledger_updates_are_not_lost() {
    const THREADS: usize = 10;
    let store = seeded();
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..10 {
                    store
                        .commit(Changeset::new().adjust_user(UserId(1), dec!(-1), 0))
                        .unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.user(UserId(1)).unwrap().balance, dec!(0));

    let err = store
        .commit(Changeset::new().adjust_user(UserId(1), dec!(-0.01), 0))
        .unwrap_err();
    assert_eq!(err, ParkingError::InsufficientBalance);
}

#[test]
fn test_order_version_guard() {
    let store = seeded();
    let order = Order::reserved(OrderNo::from("ORD-1"), UserId(1), SpotId(1), "ABC123", Utc::now());
    store.commit(Changeset::new().insert_order(order.clone())).unwrap();

    let mut first = order.clone();
    first.status = OrderStatus::Cancelled;
    let mut second = order;
    second.status = OrderStatus::Occupied;

    store.commit(Changeset::new().update_order(first)).unwrap();
    let err = store.commit(Changeset::new().update_order(second)).unwrap_err();
    assert!(matches!(err, ParkingError::StaleRecord { entity: Entity::Order, .. }));
    let stored = store.order(&OrderNo::from("ORD-1")).unwrap();
    assert_eq!(stored.status, OrderStatus::Cancelled);
    assert_eq!(stored.version, 1);
}

#[test]
fn test_queries() {
    let store = seeded();
    let order = Order::reserved(OrderNo::from("ORD-1"), UserId(1), SpotId(1), "ABC123", Utc::now());
    store.commit(Changeset::new().insert_order(order)).unwrap();

    assert_eq!(store.orders_for_user(UserId(1)).unwrap().len(), 1);
    assert_eq!(store.orders_in_status(OrderStatus::Reserved).unwrap().len(), 1);
    assert!(store.orders_in_status(OrderStatus::Occupied).unwrap().is_empty());
    assert_eq!(store.spots_in_zone(ZoneId(1)).unwrap().len(), 1);
    assert!(store.spots_in_zone(ZoneId(2)).unwrap().is_empty());
    assert!(matches!(
        store.order(&OrderNo::from("ORD-404")),
        Err(ParkingError::NotFound { entity: Entity::Order, .. })
    ));
}

#[test]
fn test_spot_requires_known_zone() {
    let store = seeded();
    let err = store
        .insert_spot(Spot {
            id: SpotId(2),
            zone_id: ZoneId(9),
            label: "X".into(),
            status: SpotStatus::Free,
            current_plate: None,
            version: 0,
        })
        .unwrap_err();
    assert_eq!(err, ParkingError::not_found(Entity::Zone, ZoneId(9)));
}

#[test]
fn test_unbind_racing_reservation_never_orphans_order() {
    for _ in 0..200 {
        let store = seeded();
        let barrier = Barrier::new(2);
        let order = Order::reserved(OrderNo::from("ORD-1"), UserId(1), SpotId(1), "ABC123", Utc::now());

        let (inserted, removed) = std::thread::scope(|scope| {
            let insert = scope.spawn(|| {
                barrier.wait();
                store.commit(Changeset::new().insert_order(order.clone()))
            });
            let remove = scope.spawn(|| {
                barrier.wait();
                store.remove_vehicle(UserId(1), "ABC123")
            });
            (insert.join().unwrap(), remove.join().unwrap())
        });

        // Exactly one side wins and the survivor is consistent.
        match (inserted, removed) {
            (Ok(()), Err(e)) => {
                assert_eq!(e, ParkingError::VehicleBusy("ABC123".into()));
                assert_eq!(store.vehicle("ABC123").unwrap().owner, UserId(1));
            }
            (Err(e), Ok(_)) => {
                assert_eq!(e, ParkingError::NotOwner("ABC123".into()));
                assert!(store.active_order_for_plate("ABC123").unwrap().is_none());
            }
            other => panic!("unexpected outcome {other:?}"),
        }
    }
}
