//! Shared fixture for integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use campus_parking_lot::builders::LotBuilder;
use campus_parking_lot::config::ParkingConfig;
use campus_parking_lot::core::{ParkingLot, PaymentGateway, Role, Spot, User, Zone};
use campus_parking_lot::infra::gateway::MockGateway;
use campus_parking_lot::infra::notifier::InMemoryNotifier;
use campus_parking_lot::infra::store::InMemoryStore;
use campus_parking_lot::util::clock::ManualClock;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

pub struct Fixture {
    pub lot: Arc<ParkingLot>,
    pub store: Arc<InMemoryStore>,
    pub clock: ManualClock,
    pub notifier: Arc<InMemoryNotifier>,
    pub gateway: MockGateway,
    pub zone: Zone,
    pub spots: Vec<Spot>,
    pub admin: User,
}

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
}

/// Lot with one zone at 5.00/hour, no free time, and `spots` free spots.
pub fn fixture_with(config: ParkingConfig, spots: usize) -> Fixture {
    fixture_with_gateway(config, spots, |gateway| Arc::new(gateway) as Arc<dyn PaymentGateway>)
}

/// Like [`fixture_with`], with the lot talking to `wrap(mock)` instead of
/// the mock directly. `Fixture::gateway` still records every call.
pub fn fixture_with_gateway(
    config: ParkingConfig,
    spots: usize,
    wrap: impl FnOnce(MockGateway) -> Arc<dyn PaymentGateway>,
) -> Fixture {
    let store = Arc::new(InMemoryStore::new());
    let clock = ManualClock::new(t0());
    let notifier = Arc::new(InMemoryNotifier::new(1_000));
    let gateway = MockGateway::new();
    let lot = LotBuilder::new(config)
        .store(store.clone())
        .notifier(notifier.clone())
        .gateway(wrap(gateway.clone()))
        .clock(Arc::new(clock.clone()))
        .build()
        .expect("valid config");
    let lot = Arc::new(lot);

    let admin = lot.register_user("root", Role::Admin, Decimal::ZERO).unwrap();
    let zone = lot.add_zone(admin.id, "A", dec!(5), 0).unwrap();
    let spots = (0..spots)
        .map(|i| lot.add_spot(admin.id, zone.id, &format!("A-{:03}", i + 1)).unwrap())
        .collect();
    notifier.clear();

    Fixture {
        lot,
        store,
        clock,
        notifier,
        gateway,
        zone,
        spots,
        admin,
    }
}

pub fn fixture(spots: usize) -> Fixture {
    fixture_with(ParkingConfig::default(), spots)
}

impl Fixture {
    /// Register a user and bind `plate` to them.
    pub fn driver(&self, name: &str, role: Role, balance: Decimal, plate: &str) -> User {
        let user = self.lot.register_user(name, role, balance).unwrap();
        self.lot.bind_vehicle(user.id, plate, None).unwrap();
        user
    }

    pub fn spot(&self, index: usize) -> &Spot {
        &self.spots[index]
    }
}
