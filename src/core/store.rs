//! Storage abstraction: CRUD plus atomic, version-guarded changesets.

use rust_decimal::Decimal;

use crate::core::error::{Entity, ParkingError};
use crate::core::model::{Order, OrderStatus, Spot, User, Vehicle, Zone};
use crate::util::ids::{OrderNo, SpotId, UserId, ZoneId};

/// Relative adjustment of a user's balance and trust score.
///
/// Applied under the user's record lock so concurrent debits, credits and
/// penalties never lose an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Account to adjust.
    pub user_id: UserId,
    /// Signed balance change; the commit fails if the result would go negative.
    pub balance_delta: Decimal,
    /// Signed trust change; the result is clamped to `[0, 100]`.
    pub trust_delta: i16,
}

/// A unit of work committed atomically by [`ParkingStore::commit`].
///
/// Spot and order records carry the `version` they were read at; the commit
/// fails with [`ParkingError::StaleRecord`] if any stored version moved since.
#[derive(Debug, Clone, Default)]
pub struct Changeset {
    /// Spot updates, guarded by version.
    pub spots: Vec<Spot>,
    /// Order updates, guarded by version.
    pub orders: Vec<Order>,
    /// New order to insert.
    pub insert: Option<Order>,
    /// Balance and trust adjustments.
    pub ledger: Vec<LedgerEntry>,
}

impl Changeset {
    /// Empty changeset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `spot`, expecting the stored version to equal `spot.version`.
    #[must_use]
    pub fn update_spot(mut self, spot: Spot) -> Self {
        self.spots.push(spot);
        self
    }

    /// Write `order`, expecting the stored version to equal `order.version`.
    #[must_use]
    pub fn update_order(mut self, order: Order) -> Self {
        self.orders.push(order);
        self
    }

    /// Insert a new order.
    #[must_use]
    pub fn insert_order(mut self, order: Order) -> Self {
        self.insert = Some(order);
        self
    }

    /// Adjust a user's balance and trust.
    #[must_use]
    pub fn adjust_user(mut self, user_id: UserId, balance_delta: Decimal, trust_delta: i16) -> Self {
        if !balance_delta.is_zero() || trust_delta != 0 {
            self.ledger.push(LedgerEntry {
                user_id,
                balance_delta,
                trust_delta,
            });
        }
        self
    }

    /// Whether the changeset writes nothing.
    pub fn is_empty(&self) -> bool {
        self.spots.is_empty() && self.orders.is_empty() && self.insert.is_none() && self.ledger.is_empty()
    }
}

/// Persistence port used by the parking core.
///
/// Implementations must apply [`Changeset`]s atomically: either every write
/// lands or none does, and no reader observes a partial application.
/// Unrelated records must not share a lock for the duration of a commit.
pub trait ParkingStore: Send + Sync {
    /// Reserve a fresh numeric identifier for `entity`.
    fn next_id(&self, entity: Entity) -> u64;

    /// Insert a new user.
    fn insert_user(&self, user: User) -> Result<(), ParkingError>;
    /// Fetch a user.
    fn user(&self, id: UserId) -> Result<User, ParkingError>;
    /// Atomically read-modify-write a user's profile fields.
    fn update_user(
        &self,
        id: UserId,
        update: &mut dyn FnMut(&mut User) -> Result<(), ParkingError>,
    ) -> Result<User, ParkingError>;

    /// Bind a vehicle; fails if the plate is taken or the owner is at `max_per_owner`.
    fn insert_vehicle(&self, vehicle: Vehicle, max_per_owner: usize) -> Result<(), ParkingError>;
    /// Remove `owner`'s binding of `plate`.
    ///
    /// Fails with [`ParkingError::NotOwner`] if the plate is bound to someone
    /// else and with [`ParkingError::VehicleBusy`] while the plate holds a
    /// non-terminal order; the check and the removal are one atomic step.
    fn remove_vehicle(&self, owner: UserId, plate: &str) -> Result<Vehicle, ParkingError>;
    /// Fetch a vehicle by plate.
    fn vehicle(&self, plate: &str) -> Result<Vehicle, ParkingError>;
    /// Vehicles bound to `owner`.
    fn vehicles_of(&self, owner: UserId) -> Result<Vec<Vehicle>, ParkingError>;

    /// Insert or replace a zone.
    fn put_zone(&self, zone: Zone) -> Result<(), ParkingError>;
    /// Fetch a zone.
    fn zone(&self, id: ZoneId) -> Result<Zone, ParkingError>;

    /// Insert a new spot.
    fn insert_spot(&self, spot: Spot) -> Result<(), ParkingError>;
    /// Fetch a spot.
    fn spot(&self, id: SpotId) -> Result<Spot, ParkingError>;
    /// Spots in a zone, ordered by id.
    fn spots_in_zone(&self, zone: ZoneId) -> Result<Vec<Spot>, ParkingError>;

    /// Fetch an order.
    fn order(&self, no: &OrderNo) -> Result<Order, ParkingError>;
    /// Orders owned by `user`.
    fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>, ParkingError>;
    /// Orders currently in `status`.
    fn orders_in_status(&self, status: OrderStatus) -> Result<Vec<Order>, ParkingError>;
    /// The non-terminal order holding `plate`, if any.
    fn active_order_for_plate(&self, plate: &str) -> Result<Option<Order>, ParkingError>;

    /// Apply a changeset atomically.
    ///
    /// An inserted active order must name a plate bound to its user at
    /// commit time, otherwise the commit fails with [`ParkingError::NotOwner`].
    fn commit(&self, changes: Changeset) -> Result<(), ParkingError>;
}
