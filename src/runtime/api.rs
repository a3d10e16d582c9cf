//! API-facing request/response models and thin adapters over [`ParkingLot`].
//!
//! Transport layers deserialize a request, call the matching adapter and
//! serialize either the view or the [`ErrorResponse`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    ErrorKind, Order, OrderStatus, ParkingError, ParkingLot, PaymentMethod, Spot, SpotStatus,
};
use crate::util::ids::{OrderNo, SpotId, UserId, ZoneId};

/// Reservation request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveRequest {
    /// Requesting user.
    pub user_id: UserId,
    /// Target spot.
    pub spot_id: SpotId,
    /// Plate to reserve for.
    pub plate: String,
}

/// Payment request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayRequest {
    /// Paying user.
    pub user_id: UserId,
    /// Order to settle.
    pub order_no: OrderNo,
    /// How to settle.
    pub method: PaymentMethod,
}

/// Order as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    /// Order number.
    pub order_no: OrderNo,
    /// Owning user.
    pub user_id: UserId,
    /// Spot of the order.
    pub spot_id: SpotId,
    /// Plate.
    pub plate: String,
    /// Status.
    pub status: OrderStatus,
    /// Reservation time.
    pub reserved_at: DateTime<Utc>,
    /// Entry time.
    pub entered_at: Option<DateTime<Utc>>,
    /// Exit time.
    pub exited_at: Option<DateTime<Utc>>,
    /// Settlement time.
    pub paid_at: Option<DateTime<Utc>>,
    /// Amount due or settled.
    pub fee: Decimal,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        Self {
            order_no: order.no,
            user_id: order.user_id,
            spot_id: order.spot_id,
            plate: order.plate,
            status: order.status,
            reserved_at: order.reserved_at,
            entered_at: order.entered_at,
            exited_at: order.exited_at,
            paid_at: order.paid_at,
            fee: order.fee,
        }
    }
}

/// Spot as returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpotView {
    /// Spot identifier.
    pub spot_id: SpotId,
    /// Zone of the spot.
    pub zone_id: ZoneId,
    /// Painted label.
    pub label: String,
    /// Status.
    pub status: SpotStatus,
}

impl From<Spot> for SpotView {
    fn from(spot: Spot) -> Self {
        Self {
            spot_id: spot.id,
            zone_id: spot.zone_id,
            label: spot.label,
            status: spot.status,
        }
    }
}

/// Error body carrying the taxonomy kind so clients know whether to retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Taxonomy bucket.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Whether re-reading state and retrying may succeed.
    pub retryable: bool,
}

impl From<ParkingError> for ErrorResponse {
    fn from(err: ParkingError) -> Self {
        Self {
            kind: err.kind(),
            retryable: err.is_retryable(),
            message: err.to_string(),
        }
    }
}

/// Reserve a spot.
pub fn reserve_spot(lot: &ParkingLot, req: &ReserveRequest) -> Result<OrderView, ErrorResponse> {
    Ok(lot.reserve(req.user_id, req.spot_id, &req.plate)?.into())
}

/// Record a vehicle entering for an order.
pub fn enter_order(lot: &ParkingLot, no: &OrderNo) -> Result<OrderView, ErrorResponse> {
    Ok(lot.enter(no)?.into())
}

/// Record a vehicle leaving for an order.
pub fn exit_order(lot: &ParkingLot, no: &OrderNo) -> Result<OrderView, ErrorResponse> {
    Ok(lot.exit(no)?.into())
}

/// Cancel a reservation.
pub fn cancel_order(
    lot: &ParkingLot,
    actor: UserId,
    no: &OrderNo,
) -> Result<OrderView, ErrorResponse> {
    Ok(lot.cancel(actor, no)?.into())
}

/// Pay an order.
pub async fn pay_order(lot: &ParkingLot, req: &PayRequest) -> Result<OrderView, ErrorResponse> {
    Ok(lot.pay(req.user_id, &req.order_no, req.method).await?.into())
}
