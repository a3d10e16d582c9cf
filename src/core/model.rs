//! Domain records: users, vehicles, zones, spots and orders.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::util::ids::{OrderNo, SpotId, UserId, ZoneId};

/// Highest trust score a user can hold.
pub const MAX_TRUST_SCORE: u8 = 100;

/// Account role; drives fee discounts and administrative rights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// External visitor.
    Visitor,
    /// Enrolled student.
    Student,
    /// Faculty or staff member.
    Staff,
    /// Lot administrator.
    Admin,
}

impl Role {
    /// Whether this role may act on other users' records.
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }
}

/// Registered account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Identifier.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Role.
    pub role: Role,
    /// Prepaid balance; never negative.
    pub balance: Decimal,
    /// Trust score in `[0, 100]`.
    pub trust_score: u8,
    /// Disabled accounts cannot reserve.
    pub active: bool,
    /// Registration time.
    pub created_at: DateTime<Utc>,
}

/// Vehicle bound to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Normalized plate, unique across the lot.
    pub plate: String,
    /// Owning user.
    pub owner: UserId,
    /// Optional label chosen by the owner.
    pub nickname: Option<String>,
    /// Binding time.
    pub registered_at: DateTime<Utc>,
}

/// Group of spots sharing a tariff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Zone {
    /// Identifier.
    pub id: ZoneId,
    /// Display name, e.g. "A".
    pub name: String,
    /// Charge per started hour.
    pub hourly_rate: Decimal,
    /// Grace window subtracted before billing.
    pub free_minutes: u32,
}

/// Occupancy state of a spot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpotStatus {
    /// Available for reservation.
    Free,
    /// A vehicle is parked.
    Occupied,
    /// Held for a reserved order.
    Reserved,
    /// Out of service.
    Maintenance,
}

impl SpotStatus {
    /// Whether an active order must reference a spot in this status.
    pub const fn is_claimed(self) -> bool {
        matches!(self, Self::Occupied | Self::Reserved)
    }
}

impl fmt::Display for SpotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Free => "free",
            Self::Occupied => "occupied",
            Self::Reserved => "reserved",
            Self::Maintenance => "maintenance",
        };
        f.write_str(name)
    }
}

/// One physical parking space.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spot {
    /// Identifier.
    pub id: SpotId,
    /// Owning zone.
    pub zone_id: ZoneId,
    /// Painted label, e.g. "A-001".
    pub label: String,
    /// Current status.
    pub status: SpotStatus,
    /// Plate holding the spot while reserved or occupied.
    pub current_plate: Option<String>,
    /// Optimistic concurrency counter; bumped by every committed write.
    pub version: u64,
}

/// Order state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Spot held, vehicle not yet arrived.
    Reserved,
    /// Vehicle parked.
    Occupied,
    /// Vehicle left, fee due.
    PendingPayment,
    /// Fee settled.
    Completed,
    /// Reservation withdrawn before arrival.
    Cancelled,
    /// Settled fee returned.
    Refunded,
    /// Timed out; terminal but still payable.
    Violation,
}

impl OrderStatus {
    /// Statuses that hold the plate (and, except `PendingPayment`, the spot).
    pub const ACTIVE: [Self; 3] = [Self::Reserved, Self::Occupied, Self::PendingPayment];

    /// Whether the order still participates in the one-active-order rule.
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Reserved | Self::Occupied | Self::PendingPayment)
    }

    /// Whether the order still holds its spot.
    pub const fn holds_spot(self) -> bool {
        matches!(self, Self::Reserved | Self::Occupied)
    }

    /// Whether the order reached an end state.
    pub const fn is_terminal(self) -> bool {
        !self.is_active()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Reserved => "reserved",
            Self::Occupied => "occupied",
            Self::PendingPayment => "pending_payment",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Refunded => "refunded",
            Self::Violation => "violation",
        };
        f.write_str(name)
    }
}

/// How an order was settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Debited from the prepaid balance.
    Balance,
    /// Charged through the external payment gateway.
    Gateway,
}

/// One reservation-to-payment cycle for one vehicle at one spot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order number.
    pub no: OrderNo,
    /// Owning user.
    pub user_id: UserId,
    /// Target spot.
    pub spot_id: SpotId,
    /// Plate the reservation was made for.
    pub plate: String,
    /// Current status.
    pub status: OrderStatus,
    /// Reservation time.
    pub reserved_at: DateTime<Utc>,
    /// Entry time.
    pub entered_at: Option<DateTime<Utc>>,
    /// Exit time (or violation time for no-shows).
    pub exited_at: Option<DateTime<Utc>>,
    /// Settlement time.
    pub paid_at: Option<DateTime<Utc>>,
    /// Amount due or settled.
    pub fee: Decimal,
    /// Settlement method once paid.
    pub payment: Option<PaymentMethod>,
    /// Set while a gateway refund is in flight; claims the order against a
    /// second refund.
    #[serde(default)]
    pub refund_pending: bool,
    /// Optimistic concurrency counter; bumped by every committed write.
    pub version: u64,
}

impl Order {
    /// Fresh order in `Reserved` status.
    pub fn reserved(
        no: OrderNo,
        user_id: UserId,
        spot_id: SpotId,
        plate: impl Into<String>,
        at: DateTime<Utc>,
    ) -> Self {
        Self {
            no,
            user_id,
            spot_id,
            plate: plate.into(),
            status: OrderStatus::Reserved,
            reserved_at: at,
            entered_at: None,
            exited_at: None,
            paid_at: None,
            fee: Decimal::ZERO,
            payment: None,
            refund_pending: false,
            version: 0,
        }
    }
}
