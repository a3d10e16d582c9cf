//! Order transitions after allocation: enter, exit, pay, cancel, refund and
//! timeout expiry.
//!
//! Every transition is one changeset: the order is written against the
//! version it was read at, so two racing transitions on the same order cannot
//! both apply. The loser gets [`ParkingError::StaleRecord`] and must re-read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{error, info, warn};

use crate::core::error::{Entity, ParkingError};
use crate::core::fee::fee_for_stay;
use crate::core::lifecycle::Transition;
use crate::core::lot::{normalize_plate, ParkingLot};
use crate::core::model::{Order, OrderStatus, PaymentMethod, Spot, SpotStatus, User};
use crate::core::store::Changeset;
use crate::util::ids::{OrderNo, UserId};

/// Result of an expiry attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiry {
    /// The order moved to `Violation` and the penalty was applied.
    Expired,
    /// The order was no longer eligible (already handled or moved on).
    Skipped,
}

/// `spot` freed of its claim.
fn release(spot: &Spot) -> Spot {
    let mut next = spot.clone();
    next.status = SpotStatus::Free;
    next.current_plate = None;
    next
}

impl ParkingLot {
    /// The spot claimed by `order`, expected in `status`.
    ///
    /// A mismatch caused by the order moving on since it was read is reported
    /// as a stale order; any other mismatch means the records disagree.
    fn claimed_spot(&self, order: &Order, status: SpotStatus) -> Result<Spot, ParkingError> {
        let spot = self.store.spot(order.spot_id)?;
        if spot.status == status && spot.current_plate.as_deref() == Some(order.plate.as_str()) {
            return Ok(spot);
        }
        if self.store.order(&order.no)?.version != order.version {
            return Err(ParkingError::stale(Entity::Order, &order.no));
        }
        Err(ParkingError::Storage(format!(
            "spot {} is {} and does not match order {}",
            spot.id, spot.status, order.no
        )))
    }

    fn active_order_by_plate(&self, plate: &str) -> Result<Order, ParkingError> {
        let plate = normalize_plate(plate)?;
        self.store
            .active_order_for_plate(&plate)?
            .ok_or_else(|| ParkingError::not_found(Entity::Order, format!("active for {plate}")))
    }

    /// Vehicle detected entering: `Reserved -> Occupied`.
    pub fn enter(&self, no: &OrderNo) -> Result<Order, ParkingError> {
        let order = self.store.order(no)?;
        Transition::Enter.check(&order)?;
        let spot = self.claimed_spot(&order, SpotStatus::Reserved)?;

        let now = self.clock.now();
        let mut entered = order;
        entered.status = OrderStatus::Occupied;
        entered.entered_at = Some(now);
        let mut occupied = spot;
        occupied.status = SpotStatus::Occupied;

        self.store.commit(
            Changeset::new()
                .update_order(entered.clone())
                .update_spot(occupied.clone()),
        )?;
        entered.version += 1;
        occupied.version += 1;

        info!(order = %entered.no, spot = %occupied.id, plate = %entered.plate, "vehicle entered");
        self.emit_spot(&occupied);
        self.emit_order(&entered);
        Ok(entered)
    }

    /// Sensor-driven entry: find the reserved order of `plate` and enter it.
    pub fn vehicle_enter(&self, plate: &str) -> Result<Order, ParkingError> {
        let order = self.active_order_by_plate(plate)?;
        self.enter(&order.no)
    }

    /// Vehicle detected leaving, settling from balance when eligible.
    pub fn exit(&self, no: &OrderNo) -> Result<Order, ParkingError> {
        self.exit_with(no, true)
    }

    /// Sensor-driven exit: find the occupied order of `plate` and exit it.
    pub fn vehicle_exit(&self, plate: &str, auto_pay: bool) -> Result<Order, ParkingError> {
        let order = self.active_order_by_plate(plate)?;
        self.exit_with(&order.no, auto_pay)
    }

    /// Vehicle detected leaving: `Occupied -> PendingPayment`, or straight to
    /// `Completed` when `auto_pay` is set and the owner is eligible.
    ///
    /// Eligibility means a perfect trust score, no violation on record and a
    /// balance covering the fee. A zero fee always settles, without a debit,
    /// so nothing is left owing.
    pub fn exit_with(&self, no: &OrderNo, auto_pay: bool) -> Result<Order, ParkingError> {
        let order = self.store.order(no)?;
        Transition::Exit.check(&order)?;
        let entered_at = order.entered_at.ok_or_else(|| {
            ParkingError::Storage(format!("order {} is occupied without an entry time", order.no))
        })?;
        let spot = self.claimed_spot(&order, SpotStatus::Occupied)?;
        let freed = release(&spot);
        let zone = self.store.zone(spot.zone_id)?;
        let user = self.store.user(order.user_id)?;

        let now = self.clock.now();
        let fee = fee_for_stay(&zone, user.role, &self.policy.snapshot(), entered_at, now)?;

        let mut left = order;
        left.exited_at = Some(now);
        left.fee = fee;
        left.status = OrderStatus::PendingPayment;

        let settle = fee.is_zero() || (auto_pay && self.auto_pay_eligible(&user, fee)?);
        let mut committed = false;
        if settle {
            let mut settled = left.clone();
            settled.status = OrderStatus::Completed;
            settled.paid_at = Some(now);
            settled.payment = Some(PaymentMethod::Balance);
            let changes = Changeset::new()
                .update_order(settled.clone())
                .update_spot(freed.clone())
                .adjust_user(user.id, -fee, 0);
            match self.store.commit(changes) {
                Ok(()) => {
                    left = settled;
                    committed = true;
                }
                // Balance drained concurrently: leave the fee due instead.
                Err(ParkingError::InsufficientBalance) => {
                    warn!(order = %left.no, user = %user.id, "auto-pay fell through; fee left due");
                }
                Err(e) => return Err(e),
            }
        }
        if !committed {
            self.store.commit(
                Changeset::new()
                    .update_order(left.clone())
                    .update_spot(freed.clone()),
            )?;
        }
        left.version += 1;
        let mut freed = freed;
        freed.version += 1;

        info!(
            order = %left.no,
            spot = %freed.id,
            plate = %left.plate,
            %fee,
            status = %left.status,
            "vehicle exited"
        );
        self.emit_spot(&freed);
        self.emit_order(&left);
        Ok(left)
    }

    fn auto_pay_eligible(&self, user: &User, fee: Decimal) -> Result<bool, ParkingError> {
        if user.trust_score < self.config.perfect_trust_score || user.balance < fee {
            return Ok(false);
        }
        let has_violation = self
            .store
            .orders_for_user(user.id)?
            .iter()
            .any(|o| o.status == OrderStatus::Violation);
        Ok(!has_violation)
    }

    /// Settle a due order: `PendingPayment | Violation -> Completed`.
    ///
    /// Only the owner may pay. Gateway charges happen before the commit and
    /// outside every lock; a commit that then loses a race reverses the charge.
    pub async fn pay(
        &self,
        actor: UserId,
        no: &OrderNo,
        method: PaymentMethod,
    ) -> Result<Order, ParkingError> {
        let order = self.store.order(no)?;
        if actor != order.user_id {
            return Err(ParkingError::Forbidden(format!(
                "user {actor} cannot pay order {}",
                order.no
            )));
        }
        Transition::Pay.check(&order)?;

        let fee = order.fee;
        let mut paid = order;
        paid.status = OrderStatus::Completed;
        paid.paid_at = Some(self.clock.now());
        paid.payment = Some(method);

        match method {
            PaymentMethod::Balance => {
                self.store.commit(
                    Changeset::new()
                        .update_order(paid.clone())
                        .adjust_user(paid.user_id, -fee, 0),
                )?;
            }
            PaymentMethod::Gateway => {
                let charged = if fee.is_zero() {
                    None
                } else {
                    Some(self.gateway.charge(no, fee).await?)
                };
                if let Err(e) = self.store.commit(Changeset::new().update_order(paid.clone())) {
                    if let Some(receipt) = charged {
                        warn!(order = %no, reference = %receipt.reference, error = %e, "payment lost race; reversing charge");
                        if let Err(reverse) = self.gateway.refund(no, fee).await {
                            error!(order = %no, reference = %receipt.reference, error = %reverse, "charge reversal failed");
                        }
                    }
                    return Err(e);
                }
            }
        }
        paid.version += 1;

        info!(order = %paid.no, user = %paid.user_id, %fee, method = ?method, "order paid");
        self.emit_order(&paid);
        Ok(paid)
    }

    /// Withdraw a reservation: `Reserved -> Cancelled`, freeing the spot.
    ///
    /// Balance and trust are untouched.
    pub fn cancel(&self, actor: UserId, no: &OrderNo) -> Result<Order, ParkingError> {
        let order = self.store.order(no)?;
        self.authorize(actor, &order)?;
        Transition::Cancel.check(&order)?;
        let mut freed = release(&self.claimed_spot(&order, SpotStatus::Reserved)?);

        let mut cancelled = order;
        cancelled.status = OrderStatus::Cancelled;
        self.store.commit(
            Changeset::new()
                .update_order(cancelled.clone())
                .update_spot(freed.clone()),
        )?;
        cancelled.version += 1;
        freed.version += 1;

        info!(order = %cancelled.no, spot = %freed.id, actor = %actor, "reservation cancelled");
        self.emit_spot(&freed);
        self.emit_order(&cancelled);
        Ok(cancelled)
    }

    /// Reverse a settled order: `Completed -> Refunded`.
    ///
    /// Balance payments are credited back to the owner in one commit.
    /// Gateway payments are claimed first with a version-guarded
    /// `refund_pending` marker, so only one caller ever reaches the gateway;
    /// a gateway failure clears the marker and leaves the order `Completed`.
    pub async fn refund(&self, actor: UserId, no: &OrderNo) -> Result<Order, ParkingError> {
        let order = self.store.order(no)?;
        self.authorize(actor, &order)?;
        Transition::Refund.check(&order)?;
        if order.refund_pending {
            return Err(ParkingError::RefundInProgress(order.no));
        }

        let fee = order.fee;
        let through_gateway = order.payment == Some(PaymentMethod::Gateway) && !fee.is_zero();
        let mut refunded = if through_gateway {
            self.refund_through_gateway(order).await?
        } else {
            let mut refunded = order;
            refunded.status = OrderStatus::Refunded;
            let mut changes = Changeset::new().update_order(refunded.clone());
            if refunded.payment == Some(PaymentMethod::Balance) {
                changes = changes.adjust_user(refunded.user_id, fee, 0);
            }
            self.store.commit(changes)?;
            refunded
        };
        refunded.version += 1;

        info!(order = %refunded.no, actor = %actor, %fee, "order refunded");
        self.emit_order(&refunded);
        Ok(refunded)
    }

    /// Claim, reverse at the gateway, then finalize. Returns the order as
    /// written by the final commit, version not yet bumped.
    async fn refund_through_gateway(&self, order: Order) -> Result<Order, ParkingError> {
        let no = order.no.clone();
        let fee = order.fee;

        let mut claimed = order;
        claimed.refund_pending = true;
        self.store.commit(Changeset::new().update_order(claimed.clone()))?;
        claimed.version += 1;

        if let Err(e) = self.gateway.refund(&no, fee).await {
            let mut released = claimed;
            released.refund_pending = false;
            if let Err(clear) = self.store.commit(Changeset::new().update_order(released)) {
                error!(order = %no, error = %clear, "refund marker not cleared after gateway failure");
            }
            warn!(order = %no, error = %e, "gateway refund failed");
            return Err(e);
        }

        let mut refunded = claimed;
        refunded.refund_pending = false;
        refunded.status = OrderStatus::Refunded;
        if let Err(e) = self.store.commit(Changeset::new().update_order(refunded.clone())) {
            error!(order = %no, %fee, error = %e, "gateway refunded but order not marked; reconcile manually");
            return Err(e);
        }
        Ok(refunded)
    }

    /// Drive a timed-out order into `Violation` and apply the trust penalty.
    ///
    /// `transition` must be [`Transition::ReservationTimeout`] or
    /// [`Transition::PaymentTimeout`]. The order is re-read and the status
    /// re-checked first, and the write is version-guarded, so the penalty is
    /// applied at most once however many sweeps race on the same order.
    pub fn expire(
        &self,
        no: &OrderNo,
        transition: Transition,
        now: DateTime<Utc>,
    ) -> Result<Expiry, ParkingError> {
        let order = self.store.order(no)?;
        if transition.target(order.status) != Some(OrderStatus::Violation) {
            return Ok(Expiry::Skipped);
        }

        let mut violated = order;
        violated.status = OrderStatus::Violation;
        let (changes, freed) = match transition {
            Transition::ReservationTimeout => {
                violated.exited_at = Some(now);
                violated.fee = self.config.violation_fee;
                let freed = match self.claimed_spot(&violated, SpotStatus::Reserved) {
                    Ok(spot) => release(&spot),
                    Err(ParkingError::StaleRecord { .. }) => return Ok(Expiry::Skipped),
                    Err(e) => return Err(e),
                };
                let changes = Changeset::new()
                    .update_order(violated.clone())
                    .update_spot(freed.clone())
                    .adjust_user(
                        violated.user_id,
                        Decimal::ZERO,
                        -i16::from(self.config.reservation_penalty),
                    );
                (changes, Some(freed))
            }
            Transition::PaymentTimeout => {
                let changes = Changeset::new()
                    .update_order(violated.clone())
                    .adjust_user(
                        violated.user_id,
                        Decimal::ZERO,
                        -i16::from(self.config.payment_penalty),
                    );
                (changes, None)
            }
            other => {
                return Err(ParkingError::Validation(format!(
                    "{} is not a timeout",
                    other.action()
                )))
            }
        };

        match self.store.commit(changes) {
            Ok(()) => {}
            Err(ParkingError::StaleRecord { .. }) => return Ok(Expiry::Skipped),
            Err(e) => return Err(e),
        }
        violated.version += 1;

        info!(
            order = %violated.no,
            user = %violated.user_id,
            action = transition.action(),
            "order moved to violation"
        );
        if let Some(mut spot) = freed {
            spot.version += 1;
            self.emit_spot(&spot);
        }
        self.emit_order(&violated);
        Ok(Expiry::Expired)
    }
}
