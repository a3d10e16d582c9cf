//! Parking domain: records, fee engine, allocation, order lifecycle,
//! timeout sweeping and the ports to storage, notification and payment.

pub mod allocator;
pub mod error;
pub mod fee;
pub mod gateway;
pub mod lifecycle;
pub mod lot;
pub mod model;
pub mod notifier;
pub mod orders;
pub mod store;
pub mod sweeper;

pub use error::{AppResult, Entity, ErrorKind, ParkingError};
pub use fee::{billable_hours, compute_fee, fee_for_stay};
pub use gateway::{DisabledGateway, PaymentGateway, Receipt};
pub use lifecycle::Transition;
pub use lot::{normalize_plate, ParkingLot};
pub use model::{
    Order, OrderStatus, PaymentMethod, Role, Spot, SpotStatus, User, Vehicle, Zone,
    MAX_TRUST_SCORE,
};
pub use notifier::{Notifier, NullNotifier, ParkingEvent, ORDER_TOPIC, SPOT_TOPIC};
pub use orders::Expiry;
pub use store::{Changeset, LedgerEntry, ParkingStore};
#[cfg(feature = "tokio-runtime")]
pub use sweeper::SweeperHandle;
pub use sweeper::{Spawn, SweepReport, TimeoutSweeper};
