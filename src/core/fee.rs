//! Pure fee engine.
//!
//! Billing rounds every started hour up: a stay of 61 minutes is billed as two
//! hours. When free time applies it is subtracted before the ceiling, so a stay
//! inside the grace window costs nothing.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::FeePolicy;
use crate::core::error::ParkingError;
use crate::core::model::{Role, Zone};

const MILLIS_PER_MINUTE: i64 = 60_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Number of billable hours for a stay, after the grace window.
pub fn billable_hours(
    enter: DateTime<Utc>,
    exit: DateTime<Utc>,
    free_minutes: u32,
) -> Result<i64, ParkingError> {
    if exit < enter {
        return Err(ParkingError::InvalidInterval);
    }
    let stay_ms = (exit - enter).num_milliseconds();
    let grace_ms = i64::from(free_minutes) * MILLIS_PER_MINUTE;
    let billable_ms = (stay_ms - grace_ms).max(0);
    Ok((billable_ms + MILLIS_PER_HOUR - 1) / MILLIS_PER_HOUR)
}

/// Compute a parking charge.
///
/// `fee = ceil(billable minutes / 60) * hourly_rate * discount * multiplier`,
/// rounded half-up to two decimal places.
pub fn compute_fee(
    enter: DateTime<Utc>,
    exit: DateTime<Utc>,
    hourly_rate: Decimal,
    free_minutes: u32,
    discount: Decimal,
    multiplier: Decimal,
) -> Result<Decimal, ParkingError> {
    if hourly_rate.is_sign_negative() && !hourly_rate.is_zero() {
        return Err(ParkingError::Validation("hourly rate must not be negative".into()));
    }
    if discount.is_sign_negative() && !discount.is_zero() {
        return Err(ParkingError::Validation("discount must not be negative".into()));
    }
    if multiplier.is_sign_negative() && !multiplier.is_zero() {
        return Err(ParkingError::Validation("multiplier must not be negative".into()));
    }
    let hours = billable_hours(enter, exit, free_minutes)?;
    let fee = Decimal::from(hours) * hourly_rate * discount * multiplier;
    Ok(fee.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}

/// Fee for a stay in `zone` by a user with `role`, under `policy`.
pub fn fee_for_stay(
    zone: &Zone,
    role: Role,
    policy: &FeePolicy,
    enter: DateTime<Utc>,
    exit: DateTime<Utc>,
) -> Result<Decimal, ParkingError> {
    let free_minutes = if policy.apply_free_time {
        zone.free_minutes
    } else {
        0
    };
    compute_fee(
        enter,
        exit,
        zone.hourly_rate,
        free_minutes,
        policy.discounts.for_role(role),
        policy.multiplier,
    )
}
