//! Scriptable in-process payment gateway for development and tests.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::core::error::ParkingError;
use crate::core::gateway::{PaymentGateway, Receipt};
use crate::util::ids::OrderNo;

/// Call recorded by [`MockGateway`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayCall {
    /// Successful charge.
    Charge(OrderNo, Decimal),
    /// Successful refund.
    Refund(OrderNo, Decimal),
}

/// Gateway that always succeeds unless told to fail.
///
/// Clones share state so a test can keep a handle after passing one to the lot.
#[derive(Debug, Clone, Default)]
pub struct MockGateway {
    failing: Arc<AtomicBool>,
    sequence: Arc<AtomicU64>,
    calls: Arc<Mutex<Vec<GatewayCall>>>,
}

impl MockGateway {
    /// Create a succeeding gateway.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent calls fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    /// Successful calls so far.
    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().clone()
    }

    fn receipt(&self, order: &OrderNo, amount: Decimal) -> Result<Receipt, ParkingError> {
        if self.failing.load(Ordering::Acquire) {
            return Err(ParkingError::Gateway("mock gateway unavailable".into()));
        }
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(Receipt {
            reference: format!("MOCK-{seq:08}"),
            order_no: order.clone(),
            amount,
        })
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn charge(&self, order: &OrderNo, amount: Decimal) -> Result<Receipt, ParkingError> {
        let receipt = self.receipt(order, amount)?;
        self.calls.lock().push(GatewayCall::Charge(order.clone(), amount));
        Ok(receipt)
    }

    async fn refund(&self, order: &OrderNo, amount: Decimal) -> Result<Receipt, ParkingError> {
        let receipt = self.receipt(order, amount)?;
        self.calls.lock().push(GatewayCall::Refund(order.clone(), amount));
        Ok(receipt)
    }
}
