//! Error types for allocation, lifecycle and storage operations.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::model::OrderStatus;
use crate::util::ids::{OrderNo, SpotId, ZoneId};

/// Coarse classification callers use to decide how to react to a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad input shape; the caller must fix the request.
    Validation,
    /// Concurrent or state conflict; re-read state and decide again.
    Conflict,
    /// Policy refused the action; retrying without changing conditions is pointless.
    PolicyDenied,
    /// Referenced record does not exist.
    NotFound,
    /// External dependency failed; the caller may retry.
    Dependency,
}

/// Record families held by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entity {
    /// User account.
    User,
    /// Registered vehicle.
    Vehicle,
    /// Parking zone.
    Zone,
    /// Physical spot.
    Spot,
    /// Parking order.
    Order,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::User => "user",
            Self::Vehicle => "vehicle",
            Self::Zone => "zone",
            Self::Spot => "spot",
            Self::Order => "order",
        };
        f.write_str(name)
    }
}

/// Errors produced by the parking core.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParkingError {
    /// Input failed validation.
    #[error("invalid input: {0}")]
    Validation(String),
    /// Exit time precedes entry time.
    #[error("invalid interval: exit precedes entry")]
    InvalidInterval,
    /// Another reservation won the race for the spot, or it is no longer free.
    #[error("spot {0} is already taken")]
    SpotTaken(SpotId),
    /// The spot is out of service or otherwise not in a status that allows the action.
    #[error("spot {0} is unavailable")]
    SpotUnavailable(SpotId),
    /// Every spot of the zone is claimed or out of service.
    #[error("zone {0} has no free spot")]
    ZoneFull(ZoneId),
    /// The plate already has a non-terminal order.
    #[error("vehicle {0} already has an active order")]
    VehicleBusy(String),
    /// The plate is registered to some user already.
    #[error("plate {0} is already registered")]
    PlateTaken(String),
    /// The action is not allowed from the order's current status.
    #[error("order {order} is {status}; cannot {action}")]
    WrongState {
        /// Order the action targeted.
        order: OrderNo,
        /// Status observed when the action was attempted.
        status: OrderStatus,
        /// Action name.
        action: &'static str,
    },
    /// A compare-and-set lost against a concurrent writer.
    #[error("{entity} {id} was modified concurrently")]
    StaleRecord {
        /// Record family.
        entity: Entity,
        /// Record identifier.
        id: String,
    },
    /// A gateway refund for the order is already in flight.
    #[error("order {0} has a refund in progress")]
    RefundInProgress(OrderNo),
    /// Admission control rejected the reservation.
    #[error("admission denied: {0}")]
    AdmissionDenied(String),
    /// Balance does not cover the charge.
    #[error("insufficient balance")]
    InsufficientBalance,
    /// User already owns the maximum number of vehicles.
    #[error("vehicle limit of {0} reached")]
    VehicleLimit(usize),
    /// The vehicle is not registered to the requesting user.
    #[error("vehicle {0} is not owned by the requesting user")]
    NotOwner(String),
    /// The actor may not act on this record.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Referenced record does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Record family.
        entity: Entity,
        /// Record identifier.
        id: String,
    },
    /// Payment gateway failure.
    #[error("payment gateway error: {0}")]
    Gateway(String),
    /// Storage backend failure.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ParkingError {
    /// Shorthand for [`ParkingError::NotFound`].
    pub fn not_found(entity: Entity, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Shorthand for [`ParkingError::StaleRecord`].
    pub fn stale(entity: Entity, id: impl ToString) -> Self {
        Self::StaleRecord {
            entity,
            id: id.to_string(),
        }
    }

    /// Taxonomy bucket of this error.
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidInterval => ErrorKind::Validation,
            Self::SpotTaken(_)
            | Self::SpotUnavailable(_)
            | Self::ZoneFull(_)
            | Self::VehicleBusy(_)
            | Self::PlateTaken(_)
            | Self::WrongState { .. }
            | Self::StaleRecord { .. }
            | Self::RefundInProgress(_) => ErrorKind::Conflict,
            Self::AdmissionDenied(_)
            | Self::InsufficientBalance
            | Self::VehicleLimit(_)
            | Self::NotOwner(_)
            | Self::Forbidden(_) => ErrorKind::PolicyDenied,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Gateway(_) | Self::Storage(_) => ErrorKind::Dependency,
        }
    }

    /// Whether re-reading state and retrying can succeed.
    pub const fn is_retryable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Conflict | ErrorKind::Dependency)
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
