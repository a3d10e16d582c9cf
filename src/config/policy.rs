//! Lot policy configuration and the live fee-policy store.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::model::{Role, MAX_TRUST_SCORE};

/// Per-role multipliers applied to the base fee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoleDiscounts {
    /// Visitor factor.
    pub visitor: Decimal,
    /// Student factor.
    pub student: Decimal,
    /// Staff factor.
    pub staff: Decimal,
    /// Administrator factor.
    pub admin: Decimal,
}

impl Default for RoleDiscounts {
    fn default() -> Self {
        Self {
            visitor: Decimal::ONE,
            student: Decimal::new(8, 1),
            staff: Decimal::new(5, 1),
            admin: Decimal::ZERO,
        }
    }
}

impl RoleDiscounts {
    /// Factor for `role`.
    pub const fn for_role(&self, role: Role) -> Decimal {
        match role {
            Role::Visitor => self.visitor,
            Role::Student => self.student,
            Role::Staff => self.staff,
            Role::Admin => self.admin,
        }
    }

    fn validate(&self) -> Result<(), String> {
        for (name, factor) in [
            ("visitor", self.visitor),
            ("student", self.student),
            ("staff", self.staff),
            ("admin", self.admin),
        ] {
            if factor < Decimal::ZERO || factor > Decimal::ONE {
                return Err(format!("discount for {name} must be within [0, 1]"));
            }
        }
        Ok(())
    }
}

/// Pricing knobs read by the fee path at call time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeePolicy {
    /// Lot-wide multiplier (surge or promotion).
    pub multiplier: Decimal,
    /// Subtract the zone's free minutes before billing.
    pub apply_free_time: bool,
    /// Role discounts.
    pub discounts: RoleDiscounts,
}

impl Default for FeePolicy {
    fn default() -> Self {
        Self {
            multiplier: Decimal::ONE,
            apply_free_time: true,
            discounts: RoleDiscounts::default(),
        }
    }
}

impl FeePolicy {
    /// Validate multiplier and discounts.
    pub fn validate(&self) -> Result<(), String> {
        if self.multiplier < Decimal::ZERO {
            return Err("fee multiplier must not be negative".into());
        }
        self.discounts.validate()
    }
}

/// Root configuration for a parking lot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkingConfig {
    /// Minimum trust score required to reserve.
    pub min_trust_score: u8,
    /// Score that qualifies a user for auto-pay on exit.
    pub perfect_trust_score: u8,
    /// Minutes a reservation may wait for its vehicle.
    pub reservation_timeout_minutes: u32,
    /// Hours a fee may stay unpaid.
    pub payment_timeout_hours: u32,
    /// Sweeper period in seconds.
    pub sweep_interval_secs: u64,
    /// Trust deducted for a no-show reservation.
    pub reservation_penalty: u8,
    /// Trust deducted for an overdue payment.
    pub payment_penalty: u8,
    /// Fee charged to a no-show reservation.
    pub violation_fee: Decimal,
    /// Vehicles a single user may bind.
    pub max_vehicles_per_user: usize,
    /// Deny admission while the user has an unpaid order.
    pub block_unpaid_orders: bool,
    /// Initial fee policy.
    pub fee: FeePolicy,
}

impl Default for ParkingConfig {
    fn default() -> Self {
        Self {
            min_trust_score: 80,
            perfect_trust_score: MAX_TRUST_SCORE,
            reservation_timeout_minutes: 30,
            payment_timeout_hours: 24,
            sweep_interval_secs: 60,
            reservation_penalty: 10,
            payment_penalty: 5,
            violation_fee: Decimal::new(500, 2),
            max_vehicles_per_user: 3,
            block_unpaid_orders: true,
            fee: FeePolicy::default(),
        }
    }
}

impl ParkingConfig {
    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.min_trust_score > MAX_TRUST_SCORE {
            return Err(format!("min_trust_score must be at most {MAX_TRUST_SCORE}"));
        }
        if self.perfect_trust_score > MAX_TRUST_SCORE {
            return Err(format!(
                "perfect_trust_score must be at most {MAX_TRUST_SCORE}"
            ));
        }
        if self.reservation_timeout_minutes == 0 {
            return Err("reservation_timeout_minutes must be greater than 0".into());
        }
        if self.payment_timeout_hours == 0 {
            return Err("payment_timeout_hours must be greater than 0".into());
        }
        if self.sweep_interval_secs == 0 {
            return Err("sweep_interval_secs must be greater than 0".into());
        }
        if self.violation_fee < Decimal::ZERO {
            return Err("violation_fee must not be negative".into());
        }
        if self.max_vehicles_per_user == 0 {
            return Err("max_vehicles_per_user must be greater than 0".into());
        }
        self.fee.validate().map_err(|e| format!("fee policy invalid: {e}"))
    }

    /// Parse configuration from a JSON string and validate.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Build configuration from `PARKING_*` environment variables on top of
    /// the defaults, loading a `.env` file first when one exists.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();
        override_from_env("PARKING_MIN_TRUST_SCORE", &mut cfg.min_trust_score)?;
        override_from_env("PARKING_PERFECT_TRUST_SCORE", &mut cfg.perfect_trust_score)?;
        override_from_env(
            "PARKING_RESERVATION_TIMEOUT_MINUTES",
            &mut cfg.reservation_timeout_minutes,
        )?;
        override_from_env("PARKING_PAYMENT_TIMEOUT_HOURS", &mut cfg.payment_timeout_hours)?;
        override_from_env("PARKING_SWEEP_INTERVAL_SECS", &mut cfg.sweep_interval_secs)?;
        override_from_env("PARKING_RESERVATION_PENALTY", &mut cfg.reservation_penalty)?;
        override_from_env("PARKING_PAYMENT_PENALTY", &mut cfg.payment_penalty)?;
        override_from_env("PARKING_VIOLATION_FEE", &mut cfg.violation_fee)?;
        override_from_env("PARKING_MAX_VEHICLES_PER_USER", &mut cfg.max_vehicles_per_user)?;
        override_from_env("PARKING_BLOCK_UNPAID_ORDERS", &mut cfg.block_unpaid_orders)?;
        override_from_env("PARKING_FEE_MULTIPLIER", &mut cfg.fee.multiplier)?;
        override_from_env("PARKING_APPLY_FREE_TIME", &mut cfg.fee.apply_free_time)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Sweeper period as a [`Duration`].
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    /// Reservation timeout as a chrono duration.
    pub fn reservation_timeout(&self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.reservation_timeout_minutes))
    }

    /// Payment timeout as a chrono duration.
    pub fn payment_timeout(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.payment_timeout_hours))
    }
}

fn override_from_env<T>(key: &str, slot: &mut T) -> Result<(), String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => {
            *slot = raw
                .trim()
                .parse()
                .map_err(|e| format!("{key}: cannot parse `{raw}`: {e}"))?;
            Ok(())
        }
        Err(std::env::VarError::NotPresent) => Ok(()),
        Err(e) => Err(format!("{key}: {e}")),
    }
}

/// Explicit, shareable store for the live fee policy.
///
/// Administrators update it at runtime; every fee computation takes a fresh
/// snapshot so a change applies to the next exit without a restart.
#[derive(Debug, Clone, Default)]
pub struct PolicyStore {
    inner: Arc<RwLock<FeePolicy>>,
}

impl PolicyStore {
    /// Create a store seeded with `policy`.
    pub fn new(policy: FeePolicy) -> Self {
        Self {
            inner: Arc::new(RwLock::new(policy)),
        }
    }

    /// Current policy snapshot.
    pub fn snapshot(&self) -> FeePolicy {
        *self.inner.read()
    }

    /// Replace the whole policy after validation.
    pub fn replace(&self, policy: FeePolicy) -> Result<(), String> {
        policy.validate()?;
        *self.inner.write() = policy;
        Ok(())
    }

    /// Update only the lot-wide multiplier.
    pub fn set_multiplier(&self, multiplier: Decimal) -> Result<(), String> {
        let mut next = self.snapshot();
        next.multiplier = multiplier;
        next.validate()?;
        self.inner.write().multiplier = multiplier;
        Ok(())
    }
}
