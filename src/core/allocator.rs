//! Spot allocation: admission control plus an atomic claim of the spot.
//!
//! The claim is a single changeset that moves the spot to `Reserved` (guarded
//! by the version read during the availability check) and inserts the order.
//! Of N concurrent claims on one free spot, exactly one commit wins; the rest
//! observe a moved version and are reported as [`ParkingError::SpotTaken`].

use tracing::{debug, info, warn};

use crate::core::error::{Entity, ParkingError};
use crate::core::lot::{normalize_plate, ParkingLot};
use crate::core::model::{Order, OrderStatus, SpotStatus, User};
use crate::core::store::Changeset;
use crate::util::ids::{OrderNo, SpotId, UserId, ZoneId};

impl ParkingLot {
    /// Admission policy for a new reservation.
    ///
    /// Denies disabled accounts, trust below the configured minimum, any
    /// outstanding violation and, when `block_unpaid_orders` is set, any
    /// order still waiting for payment.
    pub fn check_admission(&self, user: &User) -> Result<(), ParkingError> {
        if !user.active {
            return Err(ParkingError::AdmissionDenied(format!(
                "account {} is disabled",
                user.id
            )));
        }
        if user.trust_score < self.config.min_trust_score {
            return Err(ParkingError::AdmissionDenied(format!(
                "trust score {} is below the minimum of {}",
                user.trust_score, self.config.min_trust_score
            )));
        }
        let orders = self.store.orders_for_user(user.id)?;
        if let Some(order) = orders.iter().find(|o| o.status == OrderStatus::Violation) {
            return Err(ParkingError::AdmissionDenied(format!(
                "order {} is an unresolved violation",
                order.no
            )));
        }
        if self.config.block_unpaid_orders {
            if let Some(order) = orders
                .iter()
                .find(|o| o.status == OrderStatus::PendingPayment)
            {
                return Err(ParkingError::AdmissionDenied(format!(
                    "order {} is awaiting payment",
                    order.no
                )));
            }
        }
        Ok(())
    }

    /// Reserve `spot_id` for `plate` on behalf of `user_id`.
    ///
    /// Checks run in a fixed order and the first failure wins: admission,
    /// plate already busy, plate ownership, spot availability.
    pub fn reserve(
        &self,
        user_id: UserId,
        spot_id: SpotId,
        plate: &str,
    ) -> Result<Order, ParkingError> {
        let plate = normalize_plate(plate)?;
        let user = self.store.user(user_id)?;
        if let Err(e) = self.check_admission(&user) {
            debug!(user = %user_id, error = %e, "reservation denied");
            return Err(e);
        }

        if self.store.active_order_for_plate(&plate)?.is_some() {
            return Err(ParkingError::VehicleBusy(plate));
        }

        match self.store.vehicle(&plate) {
            Ok(vehicle) if vehicle.owner == user_id => {}
            Ok(_) | Err(ParkingError::NotFound { .. }) => return Err(ParkingError::NotOwner(plate)),
            Err(e) => return Err(e),
        }

        let spot = self.store.spot(spot_id)?;
        match spot.status {
            SpotStatus::Free => {}
            SpotStatus::Maintenance => return Err(ParkingError::SpotUnavailable(spot_id)),
            SpotStatus::Reserved | SpotStatus::Occupied => {
                return Err(ParkingError::SpotTaken(spot_id))
            }
        }

        let now = self.clock.now();
        let order = Order::reserved(OrderNo::generate(now), user_id, spot_id, plate.clone(), now);
        let mut claimed = spot;
        claimed.status = SpotStatus::Reserved;
        claimed.current_plate = Some(plate.clone());

        let changes = Changeset::new()
            .update_spot(claimed.clone())
            .insert_order(order.clone());
        if let Err(e) = self.store.commit(changes) {
            let e = match e {
                ParkingError::StaleRecord {
                    entity: Entity::Spot,
                    ..
                } => ParkingError::SpotTaken(spot_id),
                other => other,
            };
            warn!(user = %user_id, spot = %spot_id, %plate, error = %e, "reservation lost");
            return Err(e);
        }
        claimed.version += 1;

        info!(order = %order.no, user = %user_id, spot = %spot_id, %plate, "spot reserved");
        self.emit_spot(&claimed);
        self.emit_order(&order);
        Ok(order)
    }

    /// Reserve the first free spot of a zone.
    ///
    /// Spots are tried in id order; a spot lost to a concurrent claim is
    /// skipped. Fails with [`ParkingError::ZoneFull`] when no free spot is
    /// left.
    pub fn reserve_in_zone(
        &self,
        user_id: UserId,
        zone_id: ZoneId,
        plate: &str,
    ) -> Result<Order, ParkingError> {
        let free: Vec<SpotId> = self
            .spots_in_zone(zone_id)?
            .into_iter()
            .filter(|s| s.status == SpotStatus::Free)
            .map(|s| s.id)
            .collect();
        for spot_id in free {
            match self.reserve(user_id, spot_id, plate) {
                Err(ParkingError::SpotTaken(_) | ParkingError::SpotUnavailable(_)) => {}
                other => return other,
            }
        }
        warn!(user = %user_id, zone = %zone_id, "no free spot in zone");
        Err(ParkingError::ZoneFull(zone_id))
    }
}
