//! Assemble a [`ParkingLot`] from configuration and collaborators.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::config::ParkingConfig;
use crate::core::{
    AppResult, DisabledGateway, Notifier, NullNotifier, ParkingError, ParkingLot, ParkingStore,
    PaymentGateway,
};
use crate::infra::store::InMemoryStore;
use crate::util::clock::{Clock, SystemClock};

/// Validate `config` and build a lot over the given collaborators.
pub fn build_lot(
    config: ParkingConfig,
    store: Arc<dyn ParkingStore>,
    notifier: Arc<dyn Notifier>,
    gateway: Arc<dyn PaymentGateway>,
    clock: Arc<dyn Clock>,
) -> Result<ParkingLot, ParkingError> {
    config
        .validate()
        .map_err(|e| ParkingError::Validation(format!("config invalid: {e}")))?;
    info!(
        min_trust = config.min_trust_score,
        reservation_timeout_minutes = config.reservation_timeout_minutes,
        payment_timeout_hours = config.payment_timeout_hours,
        "parking lot configured"
    );
    Ok(ParkingLot::new(config, store, notifier, gateway, clock))
}

/// Build an in-memory lot from `PARKING_*` environment variables.
pub fn build_lot_from_env() -> AppResult<ParkingLot> {
    let config = ParkingConfig::from_env()
        .map_err(anyhow::Error::msg)
        .context("loading parking configuration from the environment")?;
    LotBuilder::new(config)
        .build()
        .context("assembling parking lot")
}

/// Step-by-step lot construction with in-memory defaults.
///
/// Defaults: [`InMemoryStore`], [`NullNotifier`], [`DisabledGateway`] and
/// [`SystemClock`].
pub struct LotBuilder {
    config: ParkingConfig,
    store: Option<Arc<dyn ParkingStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    clock: Option<Arc<dyn Clock>>,
}

impl LotBuilder {
    /// Start from `config`.
    pub fn new(config: ParkingConfig) -> Self {
        Self {
            config,
            store: None,
            notifier: None,
            gateway: None,
            clock: None,
        }
    }

    /// Use `store` for persistence.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn ParkingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Publish events to `notifier`.
    #[must_use]
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Settle online payments through `gateway`.
    #[must_use]
    pub fn gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Read time from `clock`.
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<ParkingLot, ParkingError> {
        build_lot(
            self.config,
            self.store
                .unwrap_or_else(|| Arc::new(InMemoryStore::new())),
            self.notifier.unwrap_or_else(|| Arc::new(NullNotifier)),
            self.gateway.unwrap_or_else(|| Arc::new(DisabledGateway)),
            self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        )
    }
}
