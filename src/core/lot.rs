//! The parking lot service: accounts, fleet, lot setup and queries.
//!
//! Allocation lives in [`allocator`](crate::core::allocator) and order
//! transitions in [`orders`](crate::core::orders); both extend [`ParkingLot`].

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::config::{FeePolicy, ParkingConfig, PolicyStore};
use crate::core::error::{Entity, ParkingError};
use crate::core::gateway::PaymentGateway;
use crate::core::model::{Order, Role, Spot, SpotStatus, User, Vehicle, Zone, MAX_TRUST_SCORE};
use crate::core::notifier::{Notifier, ParkingEvent};
use crate::core::store::{Changeset, ParkingStore};
use crate::util::clock::Clock;
use crate::util::ids::{OrderNo, SpotId, UserId, ZoneId};

const MIN_PLATE_LEN: usize = 2;
const MAX_PLATE_LEN: usize = 10;

/// Campus parking lot.
///
/// Cheap to share behind an `Arc`; every method takes `&self` and all
/// coordination happens in the store's compare-and-set commits.
pub struct ParkingLot {
    pub(crate) store: Arc<dyn ParkingStore>,
    pub(crate) notifier: Arc<dyn Notifier>,
    pub(crate) gateway: Arc<dyn PaymentGateway>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) policy: PolicyStore,
    pub(crate) config: ParkingConfig,
}

impl std::fmt::Debug for ParkingLot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParkingLot")
            .field("config", &self.config)
            .field("policy", &self.policy.snapshot())
            .finish_non_exhaustive()
    }
}

impl ParkingLot {
    /// Assemble a lot from its collaborators.
    ///
    /// The live fee policy is seeded from `config.fee`.
    pub fn new(
        config: ParkingConfig,
        store: Arc<dyn ParkingStore>,
        notifier: Arc<dyn Notifier>,
        gateway: Arc<dyn PaymentGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            policy: PolicyStore::new(config.fee),
            store,
            notifier,
            gateway,
            clock,
            config,
        }
    }

    /// Static configuration.
    pub const fn config(&self) -> &ParkingConfig {
        &self.config
    }

    /// Live fee policy store.
    pub const fn policy(&self) -> &PolicyStore {
        &self.policy
    }

    /// Current time as seen by the lot.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub(crate) fn emit_spot(&self, spot: &Spot) {
        self.notifier.emit(&ParkingEvent::spot(spot));
    }

    pub(crate) fn emit_order(&self, order: &Order) {
        self.notifier.emit(&ParkingEvent::order(order));
    }

    /// Ensure `actor` owns `order` or is an administrator.
    pub(crate) fn authorize(&self, actor: UserId, order: &Order) -> Result<(), ParkingError> {
        if actor == order.user_id {
            return Ok(());
        }
        let user = self.store.user(actor)?;
        if user.role.is_admin() {
            Ok(())
        } else {
            Err(ParkingError::Forbidden(format!(
                "user {actor} cannot act on order {}",
                order.no
            )))
        }
    }

    fn require_admin(&self, actor: UserId) -> Result<User, ParkingError> {
        let user = self.store.user(actor)?;
        if user.role.is_admin() {
            Ok(user)
        } else {
            Err(ParkingError::Forbidden(format!("user {actor} is not an administrator")))
        }
    }

    // ---- accounts ----

    /// Register a new account with full trust.
    pub fn register_user(
        &self,
        name: &str,
        role: Role,
        balance: Decimal,
    ) -> Result<User, ParkingError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ParkingError::Validation("name must not be empty".into()));
        }
        if balance < Decimal::ZERO {
            return Err(ParkingError::Validation("opening balance must not be negative".into()));
        }
        let user = User {
            id: UserId(self.store.next_id(Entity::User)),
            name: name.to_owned(),
            role,
            balance,
            trust_score: MAX_TRUST_SCORE,
            active: true,
            created_at: self.clock.now(),
        };
        self.store.insert_user(user.clone())?;
        info!(user = %user.id, role = ?role, "user registered");
        Ok(user)
    }

    /// Top up a prepaid balance.
    pub fn recharge(&self, user_id: UserId, amount: Decimal) -> Result<User, ParkingError> {
        if amount <= Decimal::ZERO {
            return Err(ParkingError::Validation("recharge amount must be positive".into()));
        }
        self.store
            .commit(Changeset::new().adjust_user(user_id, amount, 0))?;
        let user = self.store.user(user_id)?;
        info!(user = %user_id, %amount, balance = %user.balance, "balance recharged");
        Ok(user)
    }

    /// Administrative trust reset.
    pub fn reset_trust(&self, actor: UserId, user_id: UserId, score: u8) -> Result<User, ParkingError> {
        self.require_admin(actor)?;
        if score > MAX_TRUST_SCORE {
            return Err(ParkingError::Validation(format!(
                "trust score must be at most {MAX_TRUST_SCORE}"
            )));
        }
        let user = self.store.update_user(user_id, &mut |user: &mut User| {
            user.trust_score = score;
            Ok(())
        })?;
        info!(admin = %actor, user = %user_id, score, "trust score reset");
        Ok(user)
    }

    /// Enable or disable an account.
    pub fn set_active(&self, actor: UserId, user_id: UserId, active: bool) -> Result<User, ParkingError> {
        self.require_admin(actor)?;
        let user = self.store.update_user(user_id, &mut |user: &mut User| {
            user.active = active;
            Ok(())
        })?;
        info!(admin = %actor, user = %user_id, active, "account status changed");
        Ok(user)
    }

    /// Change the lot-wide fee multiplier; applies from the next exit.
    pub fn set_fee_multiplier(&self, actor: UserId, multiplier: Decimal) -> Result<(), ParkingError> {
        self.require_admin(actor)?;
        self.policy
            .set_multiplier(multiplier)
            .map_err(ParkingError::Validation)?;
        info!(admin = %actor, %multiplier, "fee multiplier updated");
        Ok(())
    }

    /// Replace the whole fee policy; applies from the next exit.
    pub fn set_fee_policy(&self, actor: UserId, policy: FeePolicy) -> Result<(), ParkingError> {
        self.require_admin(actor)?;
        self.policy.replace(policy).map_err(ParkingError::Validation)?;
        info!(admin = %actor, "fee policy replaced");
        Ok(())
    }

    // ---- fleet ----

    /// Bind a vehicle to `user_id`.
    pub fn bind_vehicle(
        &self,
        user_id: UserId,
        plate: &str,
        nickname: Option<&str>,
    ) -> Result<Vehicle, ParkingError> {
        let plate = normalize_plate(plate)?;
        self.store.user(user_id)?;
        let vehicle = Vehicle {
            plate,
            owner: user_id,
            nickname: nickname.map(str::trim).filter(|n| !n.is_empty()).map(str::to_owned),
            registered_at: self.clock.now(),
        };
        self.store
            .insert_vehicle(vehicle.clone(), self.config.max_vehicles_per_user)?;
        info!(user = %user_id, plate = %vehicle.plate, "vehicle bound");
        Ok(vehicle)
    }

    /// Unbind a vehicle; refused while the plate has an active order.
    pub fn unbind_vehicle(&self, user_id: UserId, plate: &str) -> Result<Vehicle, ParkingError> {
        let plate = normalize_plate(plate)?;
        let removed = self.store.remove_vehicle(user_id, &plate)?;
        info!(user = %user_id, plate = %removed.plate, "vehicle unbound");
        Ok(removed)
    }

    /// Vehicles bound to `user_id`.
    pub fn vehicles_of(&self, user_id: UserId) -> Result<Vec<Vehicle>, ParkingError> {
        self.store.vehicles_of(user_id)
    }

    // ---- lot setup ----

    /// Create a zone. Admin only.
    pub fn add_zone(
        &self,
        actor: UserId,
        name: &str,
        hourly_rate: Decimal,
        free_minutes: u32,
    ) -> Result<Zone, ParkingError> {
        self.require_admin(actor)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ParkingError::Validation("zone name must not be empty".into()));
        }
        validate_rate(hourly_rate)?;
        let zone = Zone {
            id: ZoneId(self.store.next_id(Entity::Zone)),
            name: name.to_owned(),
            hourly_rate,
            free_minutes,
        };
        self.store.put_zone(zone.clone())?;
        info!(admin = %actor, zone = %zone.id, name = %zone.name, rate = %hourly_rate, "zone created");
        Ok(zone)
    }

    /// Change a zone's tariff; applies from the next exit. Admin only.
    pub fn update_zone(
        &self,
        actor: UserId,
        zone_id: ZoneId,
        hourly_rate: Decimal,
        free_minutes: u32,
    ) -> Result<Zone, ParkingError> {
        self.require_admin(actor)?;
        validate_rate(hourly_rate)?;
        let mut zone = self.store.zone(zone_id)?;
        zone.hourly_rate = hourly_rate;
        zone.free_minutes = free_minutes;
        self.store.put_zone(zone.clone())?;
        info!(admin = %actor, zone = %zone_id, rate = %hourly_rate, free_minutes, "zone tariff updated");
        Ok(zone)
    }

    /// Add a free spot to a zone. Admin only.
    pub fn add_spot(&self, actor: UserId, zone_id: ZoneId, label: &str) -> Result<Spot, ParkingError> {
        self.require_admin(actor)?;
        let label = label.trim();
        if label.is_empty() {
            return Err(ParkingError::Validation("spot label must not be empty".into()));
        }
        let spot = Spot {
            id: SpotId(self.store.next_id(Entity::Spot)),
            zone_id,
            label: label.to_owned(),
            status: SpotStatus::Free,
            current_plate: None,
            version: 0,
        };
        self.store.insert_spot(spot.clone())?;
        info!(admin = %actor, spot = %spot.id, zone = %zone_id, label = %spot.label, "spot added");
        self.emit_spot(&spot);
        Ok(spot)
    }

    /// Take a free spot out of service, or return it. Admin only.
    ///
    /// Only `Free` and `Maintenance` are interchangeable; a claimed spot is
    /// reported as [`ParkingError::SpotUnavailable`].
    pub fn set_maintenance(
        &self,
        actor: UserId,
        spot_id: SpotId,
        on: bool,
    ) -> Result<Spot, ParkingError> {
        self.require_admin(actor)?;
        let spot = self.store.spot(spot_id)?;
        let (from, to) = if on {
            (SpotStatus::Free, SpotStatus::Maintenance)
        } else {
            (SpotStatus::Maintenance, SpotStatus::Free)
        };
        if spot.status == to {
            return Ok(spot);
        }
        if spot.status != from {
            warn!(spot = %spot_id, status = %spot.status, "maintenance toggle refused");
            return Err(ParkingError::SpotUnavailable(spot_id));
        }
        let mut next = spot;
        next.status = to;
        self.store
            .commit(Changeset::new().update_spot(next.clone()))
            .map_err(|e| match e {
                ParkingError::StaleRecord { .. } => ParkingError::SpotUnavailable(spot_id),
                other => other,
            })?;
        next.version += 1;
        info!(admin = %actor, spot = %spot_id, status = %to, "spot maintenance toggled");
        self.emit_spot(&next);
        Ok(next)
    }

    // ---- queries ----

    /// Fetch a user.
    pub fn user(&self, user_id: UserId) -> Result<User, ParkingError> {
        self.store.user(user_id)
    }

    /// Fetch an order.
    pub fn order(&self, no: &OrderNo) -> Result<Order, ParkingError> {
        self.store.order(no)
    }

    /// Orders of a user: active ones first, then newest first.
    pub fn orders_for_user(&self, user_id: UserId) -> Result<Vec<Order>, ParkingError> {
        let mut orders = self.store.orders_for_user(user_id)?;
        orders.sort_by(|a, b| {
            b.status
                .is_active()
                .cmp(&a.status.is_active())
                .then_with(|| b.reserved_at.cmp(&a.reserved_at))
        });
        Ok(orders)
    }

    /// Spots of a zone, ordered by id.
    pub fn spots_in_zone(&self, zone_id: ZoneId) -> Result<Vec<Spot>, ParkingError> {
        self.store.zone(zone_id)?;
        self.store.spots_in_zone(zone_id)
    }

    /// Fetch a spot.
    pub fn spot(&self, spot_id: SpotId) -> Result<Spot, ParkingError> {
        self.store.spot(spot_id)
    }
}

fn validate_rate(rate: Decimal) -> Result<(), ParkingError> {
    if rate < Decimal::ZERO {
        return Err(ParkingError::Validation("hourly rate must not be negative".into()));
    }
    Ok(())
}

/// Canonical form of a licence plate: trimmed, inner spaces removed, ASCII
/// letters upper-cased.
///
/// A plate is 2 to 10 characters of letters, digits or `-`, starting with a
/// letter (a non-ASCII province glyph counts as a letter).
pub fn normalize_plate(raw: &str) -> Result<String, ParkingError> {
    let plate: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect();
    let len = plate.chars().count();
    if !(MIN_PLATE_LEN..=MAX_PLATE_LEN).contains(&len) {
        return Err(ParkingError::Validation(format!(
            "plate must be {MIN_PLATE_LEN} to {MAX_PLATE_LEN} characters"
        )));
    }
    if !plate.chars().next().is_some_and(char::is_alphabetic) {
        return Err(ParkingError::Validation("plate must start with a letter".into()));
    }
    if !plate.chars().all(|c| c.is_alphanumeric() || c == '-') {
        return Err(ParkingError::Validation(format!("plate `{raw}` has invalid characters")));
    }
    Ok(plate)
}
