//! Tests for notifier sinks

use campus_parking_lot::core::{
    Notifier, NullNotifier, Order, OrderStatus, ParkingEvent, Spot, SpotStatus, ORDER_TOPIC,
    SPOT_TOPIC,
};
use campus_parking_lot::infra::notifier::{BroadcastNotifier, InMemoryNotifier};
use campus_parking_lot::util::ids::{OrderNo, SpotId, UserId, ZoneId};
use chrono::Utc;

fn spot(id: u64, status: SpotStatus) -> Spot {
    Spot {
        id: SpotId(id),
        zone_id: ZoneId(1),
        label: format!("A-{id:03}"),
        status,
        current_plate: None,
        version: 0,
    }
}

#[test]
fn test_events_route_to_topics() {
    let sink = InMemoryNotifier::new(16);
    sink.emit(&ParkingEvent::spot(&spot(1, SpotStatus::Reserved)));
    let order = Order::reserved(OrderNo::from("ORD-1"), UserId(7), SpotId(1), "ABC123", Utc::now());
    sink.emit(&ParkingEvent::order(&order));

    assert_eq!(sink.events().len(), 2);
    assert_eq!(sink.events_on(SPOT_TOPIC).len(), 1);
    match &sink.events_on(ORDER_TOPIC)[0] {
        ParkingEvent::OrderStatus { order_no, status, .. } => {
            assert_eq!(order_no, &OrderNo::from("ORD-1"));
            assert_eq!(*status, OrderStatus::Reserved);
        }
        other => panic!("unexpected event {other:?}"),
    }
}

#[test]
fn test_in_memory_sink_is_bounded() {
    let sink = InMemoryNotifier::new(3);
    for id in 0..5 {
        sink.emit(&ParkingEvent::spot(&spot(id, SpotStatus::Free)));
    }
    let ids: Vec<SpotId> = sink
        .events()
        .into_iter()
        .map(|p| match p.event {
            ParkingEvent::SpotStatus { spot_id, .. } => spot_id,
            ParkingEvent::OrderStatus { .. } => unreachable!(),
        })
        .collect();
    assert_eq!(ids, vec![SpotId(2), SpotId(3), SpotId(4)]);
    sink.clear();
    assert!(sink.events().is_empty());
}

#[test]
fn test_null_notifier_accepts_everything() {
    NullNotifier.emit(&ParkingEvent::spot(&spot(1, SpotStatus::Free)));
}

#[test]
fn test_event_json_shape() {
    let json = serde_json::to_value(ParkingEvent::spot(&spot(9, SpotStatus::Maintenance))).unwrap();
    assert_eq!(json["type"], "spot_status");
    assert_eq!(json["spot_id"], 9);
    assert_eq!(json["status"], "maintenance");
}

#[tokio::test]
async fn test_broadcast_without_subscribers_does_not_fail() {
    let notifier = BroadcastNotifier::new(4);
    notifier.emit(&ParkingEvent::spot(&spot(1, SpotStatus::Free)));

    let mut rx = notifier.subscribe();
    notifier.emit(&ParkingEvent::spot(&spot(2, SpotStatus::Occupied)));
    let msg = rx.recv().await.unwrap();
    assert_eq!(msg.topic, SPOT_TOPIC);
    assert!(msg.payload.contains("\"occupied\""));
}
