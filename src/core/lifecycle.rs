//! Order state machine transition table.

use crate::core::error::ParkingError;
use crate::core::model::{Order, OrderStatus};

/// Every event that can move an order between statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transition {
    /// Vehicle detected entering.
    Enter,
    /// Vehicle detected leaving; fee becomes due.
    Exit,
    /// Vehicle detected leaving and the fee was settled from balance on the spot.
    ExitSettled,
    /// Explicit payment.
    Pay,
    /// Reservation withdrawn.
    Cancel,
    /// Settled fee returned.
    Refund,
    /// Fee left unpaid past the deadline.
    PaymentTimeout,
    /// Vehicle never arrived.
    ReservationTimeout,
}

impl Transition {
    /// Status reached when this transition fires from `from`, or `None` if the
    /// transition is not allowed there.
    pub const fn target(self, from: OrderStatus) -> Option<OrderStatus> {
        use OrderStatus as S;
        match (self, from) {
            (Self::Enter, S::Reserved) => Some(S::Occupied),
            (Self::Exit, S::Occupied) => Some(S::PendingPayment),
            (Self::ExitSettled, S::Occupied) | (Self::Pay, S::PendingPayment | S::Violation) => {
                Some(S::Completed)
            }
            (Self::Cancel, S::Reserved) => Some(S::Cancelled),
            (Self::Refund, S::Completed) => Some(S::Refunded),
            (Self::PaymentTimeout, S::PendingPayment)
            | (Self::ReservationTimeout, S::Reserved) => Some(S::Violation),
            _ => None,
        }
    }

    /// Verb used in error messages and logs.
    pub const fn action(self) -> &'static str {
        match self {
            Self::Enter => "enter",
            Self::Exit | Self::ExitSettled => "exit",
            Self::Pay => "pay",
            Self::Cancel => "cancel",
            Self::Refund => "refund",
            Self::PaymentTimeout => "expire payment",
            Self::ReservationTimeout => "expire reservation",
        }
    }

    /// Check the transition against `order` and return the target status.
    pub fn check(self, order: &Order) -> Result<OrderStatus, ParkingError> {
        self.target(order.status)
            .ok_or_else(|| ParkingError::WrongState {
                order: order.no.clone(),
                status: order.status,
                action: self.action(),
            })
    }
}
