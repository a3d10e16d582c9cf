//! Background timeout sweeper.
//!
//! Each pass scans two populations: reserved orders whose vehicle never
//! arrived, and exited orders left unpaid. Matches are driven into
//! `Violation` through [`ParkingLot::expire`], which re-reads and
//! version-guards every order, so passes may overlap or repeat without
//! double penalties.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::core::lifecycle::Transition;
use crate::core::lot::ParkingLot;
use crate::core::model::{Order, OrderStatus};
use crate::core::orders::Expiry;

/// Abstract spawner for the sweeper loop and other background work.
pub trait Spawn {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}

/// Outcome counters of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    /// Unpaid orders moved to `Violation`.
    pub payment_violations: usize,
    /// No-show reservations moved to `Violation`.
    pub reservation_violations: usize,
    /// Matches that were already handled by someone else.
    pub skipped: usize,
    /// Orders (or scans) that failed and were left for the next pass.
    pub failures: usize,
}

impl SweepReport {
    /// Total orders moved to `Violation`.
    pub const fn violations(&self) -> usize {
        self.payment_violations + self.reservation_violations
    }
}

/// Periodic driver of payment and reservation timeouts.
#[derive(Debug, Clone)]
pub struct TimeoutSweeper {
    lot: Arc<ParkingLot>,
}

fn overdue(since: DateTime<Utc>, now: DateTime<Utc>, limit: Duration) -> bool {
    now.signed_duration_since(since) > limit
}

impl TimeoutSweeper {
    /// Sweeper over `lot`.
    pub const fn new(lot: Arc<ParkingLot>) -> Self {
        Self { lot }
    }

    /// Run one pass at the lot's current time.
    pub fn run_once(&self) -> SweepReport {
        self.run_at(self.lot.now())
    }

    /// Run one pass as of `now`.
    ///
    /// A failure on one order is logged and counted; the pass carries on.
    pub fn run_at(&self, now: DateTime<Utc>) -> SweepReport {
        let mut report = SweepReport::default();
        let config = self.lot.config();

        let payment_limit = config.payment_timeout();
        self.scan(
            OrderStatus::PendingPayment,
            Transition::PaymentTimeout,
            |order| overdue(order.exited_at.unwrap_or(order.reserved_at), now, payment_limit),
            now,
            &mut report,
        );

        let reservation_limit = config.reservation_timeout();
        self.scan(
            OrderStatus::Reserved,
            Transition::ReservationTimeout,
            |order| overdue(order.reserved_at, now, reservation_limit),
            now,
            &mut report,
        );

        if report.violations() > 0 || report.failures > 0 {
            info!(
                payment = report.payment_violations,
                reservation = report.reservation_violations,
                skipped = report.skipped,
                failures = report.failures,
                "sweep pass finished"
            );
        } else {
            debug!(skipped = report.skipped, "sweep pass found nothing");
        }
        report
    }

    fn scan(
        &self,
        status: OrderStatus,
        transition: Transition,
        is_overdue: impl Fn(&Order) -> bool,
        now: DateTime<Utc>,
        report: &mut SweepReport,
    ) {
        let candidates = match self.lot.store.orders_in_status(status) {
            Ok(orders) => orders,
            Err(e) => {
                error!(%status, error = %e, "sweep scan failed");
                report.failures += 1;
                return;
            }
        };

        for order in candidates.iter().filter(|o| is_overdue(o)) {
            match self.lot.expire(&order.no, transition, now) {
                Ok(Expiry::Expired) => match transition {
                    Transition::PaymentTimeout => report.payment_violations += 1,
                    _ => report.reservation_violations += 1,
                },
                Ok(Expiry::Skipped) => report.skipped += 1,
                Err(e) => {
                    error!(order = %order.no, action = transition.action(), error = %e, "order expiry failed");
                    report.failures += 1;
                }
            }
        }
    }

    /// Run passes every `sweep_interval_secs` on `spawner` until the handle
    /// is shut down.
    #[cfg(feature = "tokio-runtime")]
    pub fn spawn<S: Spawn>(self, spawner: &S) -> SweeperHandle {
        use std::sync::atomic::{AtomicU64, Ordering};

        let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
        let passes = Arc::new(AtomicU64::new(0));
        let counter = Arc::clone(&passes);
        let period = self.lot.config().sweep_interval();

        spawner.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        self.run_once();
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            break;
                        }
                    }
                }
            }
            info!("sweeper stopped");
        });

        SweeperHandle {
            stop: stop_tx,
            passes,
        }
    }
}

/// Control handle of a spawned sweeper loop. Dropping it also stops the loop.
#[cfg(feature = "tokio-runtime")]
#[derive(Debug)]
pub struct SweeperHandle {
    stop: tokio::sync::watch::Sender<bool>,
    passes: Arc<std::sync::atomic::AtomicU64>,
}

#[cfg(feature = "tokio-runtime")]
impl SweeperHandle {
    /// Ask the loop to stop after its current pass.
    pub fn shutdown(&self) {
        // A closed channel means the loop is already gone.
        let _ = self.stop.send(true);
    }

    /// Passes completed so far.
    pub fn passes(&self) -> u64 {
        self.passes.load(std::sync::atomic::Ordering::Relaxed)
    }
}
