//! Payment gateway port.
//!
//! Gateway calls are made outside every store lock. A failure is reported as
//! [`ParkingError::Gateway`](crate::core::ParkingError::Gateway) and is never
//! treated as success.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::error::ParkingError;
use crate::util::ids::OrderNo;

/// Proof of a gateway-side money movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Gateway transaction reference.
    pub reference: String,
    /// Order the movement belongs to.
    pub order_no: OrderNo,
    /// Amount moved.
    pub amount: Decimal,
}

/// External payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Charge `amount` for `order`.
    async fn charge(&self, order: &OrderNo, amount: Decimal) -> Result<Receipt, ParkingError>;

    /// Reverse `amount` previously charged for `order`.
    async fn refund(&self, order: &OrderNo, amount: Decimal) -> Result<Receipt, ParkingError>;
}

/// Gateway used when online payment is not configured; every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn charge(&self, _order: &OrderNo, _amount: Decimal) -> Result<Receipt, ParkingError> {
        Err(ParkingError::Gateway("online payment is not configured".into()))
    }

    async fn refund(&self, _order: &OrderNo, _amount: Decimal) -> Result<Receipt, ParkingError> {
        Err(ParkingError::Gateway("online payment is not configured".into()))
    }
}
