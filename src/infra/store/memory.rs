//! In-memory store with per-record locks and version-guarded commits.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard, RwLock};
use rust_decimal::Decimal;

use crate::core::error::{Entity, ParkingError};
use crate::core::model::{Order, OrderStatus, Spot, User, Vehicle, Zone, MAX_TRUST_SCORE};
use crate::core::store::{Changeset, ParkingStore};
use crate::util::ids::{OrderNo, SpotId, UserId, ZoneId};

/// Record slot: the map is only locked long enough to clone the `Arc`, the
/// record itself is guarded by its own mutex.
type Slot<T> = Arc<Mutex<T>>;

/// Thread-safe in-memory [`ParkingStore`] for development, tests and
/// single-process deployments.
///
/// Design:
/// - `RwLock` maps from id to slot (read-heavy, write on insert)
/// - per-record `Mutex` so commits touching different spots or orders never
///   contend with each other
/// - commits lock every touched record in a fixed order (users, spots,
///   orders) before validating, so concurrent commits cannot deadlock
/// - an active-plate index enforces one non-terminal order per plate; it is
///   locked before the vehicle map wherever both are needed, so unbinding a
///   plate and inserting an order for it serialize
pub struct InMemoryStore {
    users: RwLock<HashMap<UserId, Slot<User>>>,
    vehicles: Mutex<HashMap<String, Vehicle>>,
    zones: RwLock<HashMap<ZoneId, Zone>>,
    spots: RwLock<HashMap<SpotId, Slot<Spot>>>,
    orders: RwLock<HashMap<OrderNo, Slot<Order>>>,
    active_plates: Mutex<HashMap<String, OrderNo>>,
    next_id: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            vehicles: Mutex::new(HashMap::new()),
            zones: RwLock::new(HashMap::new()),
            spots: RwLock::new(HashMap::new()),
            orders: RwLock::new(HashMap::new()),
            active_plates: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn user_slot(&self, id: UserId) -> Result<Slot<User>, ParkingError> {
        self.users
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ParkingError::not_found(Entity::User, id))
    }

    fn spot_slot(&self, id: SpotId) -> Result<Slot<Spot>, ParkingError> {
        self.spots
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ParkingError::not_found(Entity::Spot, id))
    }

    fn order_slot(&self, no: &OrderNo) -> Result<Slot<Order>, ParkingError> {
        self.orders
            .read()
            .get(no)
            .cloned()
            .ok_or_else(|| ParkingError::not_found(Entity::Order, no))
    }

    fn all_orders(&self) -> Vec<Slot<Order>> {
        self.orders.read().values().cloned().collect()
    }
}

/// Lock a sorted list of slots, keeping the guards alongside their keys.
fn lock_all<'a, K: Copy, T>(slots: &'a [(K, Slot<T>)]) -> Vec<(K, MutexGuard<'a, T>)> {
    slots.iter().map(|(key, slot)| (*key, slot.lock())).collect()
}

impl ParkingStore for InMemoryStore {
    fn next_id(&self, _entity: Entity) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn insert_user(&self, user: User) -> Result<(), ParkingError> {
        let mut users = self.users.write();
        if users.contains_key(&user.id) {
            return Err(ParkingError::Storage(format!("duplicate user id {}", user.id)));
        }
        users.insert(user.id, Arc::new(Mutex::new(user)));
        Ok(())
    }

    fn user(&self, id: UserId) -> Result<User, ParkingError> {
        let slot = self.user_slot(id)?;
        let user = slot.lock().clone();
        Ok(user)
    }

    fn update_user(
        &self,
        id: UserId,
        update: &mut dyn FnMut(&mut User) -> Result<(), ParkingError>,
    ) -> Result<User, ParkingError> {
        let slot = self.user_slot(id)?;
        let mut guard = slot.lock();
        let mut draft = guard.clone();
        update(&mut draft)?;
        *guard = draft;
        Ok(guard.clone())
    }

    fn insert_vehicle(&self, vehicle: Vehicle, max_per_owner: usize) -> Result<(), ParkingError> {
        let mut vehicles = self.vehicles.lock();
        if vehicles.contains_key(&vehicle.plate) {
            return Err(ParkingError::PlateTaken(vehicle.plate));
        }
        let owned = vehicles.values().filter(|v| v.owner == vehicle.owner).count();
        if owned >= max_per_owner {
            return Err(ParkingError::VehicleLimit(max_per_owner));
        }
        vehicles.insert(vehicle.plate.clone(), vehicle);
        Ok(())
    }

    fn remove_vehicle(&self, owner: UserId, plate: &str) -> Result<Vehicle, ParkingError> {
        // Same order as `commit`: plate index first, then vehicles.
        let plates = self.active_plates.lock();
        let mut vehicles = self.vehicles.lock();
        match vehicles.get(plate) {
            None => return Err(ParkingError::not_found(Entity::Vehicle, plate)),
            Some(vehicle) if vehicle.owner != owner => {
                return Err(ParkingError::NotOwner(plate.to_owned()));
            }
            Some(_) => {}
        }
        if plates.contains_key(plate) {
            return Err(ParkingError::VehicleBusy(plate.to_owned()));
        }
        vehicles
            .remove(plate)
            .ok_or_else(|| ParkingError::not_found(Entity::Vehicle, plate))
    }

    fn vehicle(&self, plate: &str) -> Result<Vehicle, ParkingError> {
        self.vehicles
            .lock()
            .get(plate)
            .cloned()
            .ok_or_else(|| ParkingError::not_found(Entity::Vehicle, plate))
    }

    fn vehicles_of(&self, owner: UserId) -> Result<Vec<Vehicle>, ParkingError> {
        let mut owned: Vec<Vehicle> = self
            .vehicles
            .lock()
            .values()
            .filter(|v| v.owner == owner)
            .cloned()
            .collect();
        owned.sort_by(|a, b| a.registered_at.cmp(&b.registered_at));
        Ok(owned)
    }

    fn put_zone(&self, zone: Zone) -> Result<(), ParkingError> {
        self.zones.write().insert(zone.id, zone);
        Ok(())
    }

    fn zone(&self, id: ZoneId) -> Result<Zone, ParkingError> {
        self.zones
            .read()
            .get(&id)
            .cloned()
            .ok_or_else(|| ParkingError::not_found(Entity::Zone, id))
    }

    fn insert_spot(&self, spot: Spot) -> Result<(), ParkingError> {
        if !self.zones.read().contains_key(&spot.zone_id) {
            return Err(ParkingError::not_found(Entity::Zone, spot.zone_id));
        }
        let mut spots = self.spots.write();
        if spots.contains_key(&spot.id) {
            return Err(ParkingError::Storage(format!("duplicate spot id {}", spot.id)));
        }
        spots.insert(spot.id, Arc::new(Mutex::new(spot)));
        Ok(())
    }

    fn spot(&self, id: SpotId) -> Result<Spot, ParkingError> {
        let slot = self.spot_slot(id)?;
        let spot = slot.lock().clone();
        Ok(spot)
    }

    fn spots_in_zone(&self, zone: ZoneId) -> Result<Vec<Spot>, ParkingError> {
        let slots: Vec<Slot<Spot>> = self.spots.read().values().cloned().collect();
        let mut spots: Vec<Spot> = slots
            .iter()
            .map(|slot| slot.lock().clone())
            .filter(|spot| spot.zone_id == zone)
            .collect();
        spots.sort_by_key(|spot| spot.id);
        Ok(spots)
    }

    fn order(&self, no: &OrderNo) -> Result<Order, ParkingError> {
        let slot = self.order_slot(no)?;
        let order = slot.lock().clone();
        Ok(order)
    }

    fn orders_for_user(&self, user: UserId) -> Result<Vec<Order>, ParkingError> {
        Ok(self
            .all_orders()
            .iter()
            .map(|slot| slot.lock().clone())
            .filter(|order| order.user_id == user)
            .collect())
    }

    fn orders_in_status(&self, status: OrderStatus) -> Result<Vec<Order>, ParkingError> {
        Ok(self
            .all_orders()
            .iter()
            .map(|slot| slot.lock().clone())
            .filter(|order| order.status == status)
            .collect())
    }

    fn active_order_for_plate(&self, plate: &str) -> Result<Option<Order>, ParkingError> {
        let holder = self.active_plates.lock().get(plate).cloned();
        match holder {
            Some(no) => self.order(&no).map(Some),
            None => Ok(None),
        }
    }

    fn commit(&self, changes: Changeset) -> Result<(), ParkingError> {
        if changes.is_empty() {
            return Ok(());
        }

        // Fold ledger entries per user; BTreeMap gives the canonical lock order.
        let mut ledger: BTreeMap<UserId, (Decimal, i16)> = BTreeMap::new();
        for entry in &changes.ledger {
            let slot = ledger.entry(entry.user_id).or_insert((Decimal::ZERO, 0));
            slot.0 += entry.balance_delta;
            slot.1 = slot.1.saturating_add(entry.trust_delta);
        }
        let spot_updates: BTreeMap<SpotId, &Spot> =
            changes.spots.iter().map(|s| (s.id, s)).collect();
        let order_updates: BTreeMap<&OrderNo, &Order> =
            changes.orders.iter().map(|o| (&o.no, o)).collect();

        let user_slots = ledger
            .keys()
            .map(|id| self.user_slot(*id).map(|slot| (*id, slot)))
            .collect::<Result<Vec<_>, _>>()?;
        let spot_slots = spot_updates
            .keys()
            .map(|id| self.spot_slot(*id).map(|slot| (*id, slot)))
            .collect::<Result<Vec<_>, _>>()?;
        let order_slots = order_updates
            .keys()
            .map(|no| self.order_slot(no).map(|slot| (*no, slot)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut user_guards = lock_all(&user_slots);
        let mut spot_guards = lock_all(&spot_slots);
        let mut order_guards = lock_all(&order_slots);

        // Validate every guard before touching anything.
        for (id, guard) in &spot_guards {
            if guard.version != spot_updates[id].version {
                return Err(ParkingError::stale(Entity::Spot, id));
            }
        }
        for (no, guard) in &order_guards {
            if guard.version != order_updates[no].version {
                return Err(ParkingError::stale(Entity::Order, no));
            }
        }
        for (id, guard) in &user_guards {
            let (balance_delta, _) = ledger[id];
            if guard.balance + balance_delta < Decimal::ZERO {
                return Err(ParkingError::InsufficientBalance);
            }
        }

        let mut plates = self.active_plates.lock();
        let mut released: Vec<&str> = Vec::new();
        for (no, guard) in &order_guards {
            let next = order_updates[no];
            if guard.status.is_active() && !next.status.is_active() {
                released.push(guard.plate.as_str());
            }
        }
        if let Some(order) = &changes.insert {
            if self.orders.read().contains_key(&order.no) {
                return Err(ParkingError::Storage(format!("duplicate order {}", order.no)));
            }
            if order.status.is_active() {
                let claimed = plates.contains_key(&order.plate)
                    && !released.contains(&order.plate.as_str());
                if claimed {
                    return Err(ParkingError::VehicleBusy(order.plate.clone()));
                }
                let owned = self
                    .vehicles
                    .lock()
                    .get(&order.plate)
                    .is_some_and(|v| v.owner == order.user_id);
                if !owned {
                    return Err(ParkingError::NotOwner(order.plate.clone()));
                }
            }
        }

        // Apply.
        for (id, guard) in &mut user_guards {
            let (balance_delta, trust_delta) = ledger[&*id];
            guard.balance += balance_delta;
            let trust = i16::from(guard.trust_score) + trust_delta;
            guard.trust_score = u8::try_from(trust.clamp(0, i16::from(MAX_TRUST_SCORE)))
                .unwrap_or(MAX_TRUST_SCORE);
        }
        for (id, guard) in &mut spot_guards {
            let mut next = spot_updates[&*id].clone();
            next.version = guard.version + 1;
            **guard = next;
        }
        for plate in released {
            plates.remove(plate);
        }
        for (no, guard) in &mut order_guards {
            let mut next = order_updates[*no].clone();
            next.version = guard.version + 1;
            **guard = next;
        }
        if let Some(order) = changes.insert {
            if order.status.is_active() {
                plates.insert(order.plate.clone(), order.no.clone());
            }
            self.orders
                .write()
                .insert(order.no.clone(), Arc::new(Mutex::new(order)));
        }
        Ok(())
    }
}
