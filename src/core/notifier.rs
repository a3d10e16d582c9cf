//! Best-effort event publication to external listeners.
//!
//! Publication is fire-and-forget: sinks must not block and must swallow their
//! own delivery failures. Nothing in the state machine depends on delivery.

use serde::{Deserialize, Serialize};

use crate::core::model::{Order, OrderStatus, Spot, SpotStatus};
use crate::util::clock::now_ms;
use crate::util::ids::{OrderNo, SpotId, UserId, ZoneId};

/// Topic for spot occupancy changes.
pub const SPOT_TOPIC: &str = "spot_status_update";
/// Topic for order status changes.
pub const ORDER_TOPIC: &str = "order_status_update";

/// Event payload published to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParkingEvent {
    /// A spot changed status.
    SpotStatus {
        /// Spot identifier.
        spot_id: SpotId,
        /// Zone of the spot.
        zone_id: ZoneId,
        /// New status.
        status: SpotStatus,
        /// Plate holding the spot, if any.
        current_plate: Option<String>,
        /// Emission time, milliseconds since epoch.
        at_ms: i64,
    },
    /// An order changed status.
    OrderStatus {
        /// Order number.
        order_no: OrderNo,
        /// Owning user.
        user_id: UserId,
        /// Spot of the order.
        spot_id: SpotId,
        /// New status.
        status: OrderStatus,
        /// Emission time, milliseconds since epoch.
        at_ms: i64,
    },
}

impl ParkingEvent {
    /// Event describing the current state of `spot`.
    pub fn spot(spot: &Spot) -> Self {
        Self::SpotStatus {
            spot_id: spot.id,
            zone_id: spot.zone_id,
            status: spot.status,
            current_plate: spot.current_plate.clone(),
            at_ms: now_ms(),
        }
    }

    /// Event describing the current state of `order`.
    pub fn order(order: &Order) -> Self {
        Self::OrderStatus {
            order_no: order.no.clone(),
            user_id: order.user_id,
            spot_id: order.spot_id,
            status: order.status,
            at_ms: now_ms(),
        }
    }

    /// Topic this event belongs on.
    pub const fn topic(&self) -> &'static str {
        match self {
            Self::SpotStatus { .. } => SPOT_TOPIC,
            Self::OrderStatus { .. } => ORDER_TOPIC,
        }
    }
}

/// Push channel to interested listeners.
pub trait Notifier: Send + Sync {
    /// Publish `event` on `topic`. Must not block or fail the caller.
    fn publish(&self, topic: &str, event: &ParkingEvent);

    /// Publish on the event's own topic.
    fn emit(&self, event: &ParkingEvent) {
        self.publish(event.topic(), event);
    }
}

/// Notifier that drops everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn publish(&self, _topic: &str, _event: &ParkingEvent) {}
}
