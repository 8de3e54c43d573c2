use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::{ExchangeFilters, OrderSide, OrderStatus, TimeInForce};
use crate::error::ExchangeError;

/// Exchange-assigned order identifier
pub type OrderId = i64;

/// Acknowledgement of a newly placed order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub status: OrderStatus,
}

/// Limit order as sent to the exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LimitOrderRequest {
    pub symbol: String,
    pub side: OrderSide,
    pub quantity: Decimal,
    pub price: Decimal,
    pub time_in_force: TimeInForce,
}

impl LimitOrderRequest {
    pub fn buy(
        symbol: impl Into<String>,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            side: OrderSide::Buy,
            quantity,
            price,
            time_in_force,
        }
    }
}

/// Spot exchange capability the DCA core runs against.
///
/// Every call is a unary request/response; failures are reported as
/// [`ExchangeError`] and never retried here.
#[async_trait]
pub trait ExchangeClient: Send + Sync {
    /// Fails with a 404 `ExchangeError` if the symbol is unknown.
    async fn get_exchange_filters(&self, symbol: &str) -> Result<ExchangeFilters, ExchangeError>;

    /// Fails with a 404 `ExchangeError` if no ask is quoted.
    async fn get_best_ask(&self, symbol: &str) -> Result<Decimal, ExchangeError>;

    async fn place_limit_order(
        &self,
        request: &LimitOrderRequest,
    ) -> Result<PlacedOrder, ExchangeError>;

    async fn get_order_status(
        &self,
        symbol: &str,
        order_id: OrderId,
    ) -> Result<OrderStatus, ExchangeError>;

    async fn cancel_order(
        &self,
        symbol: &str,
        order_id: OrderId,
    ) -> Result<OrderStatus, ExchangeError>;
}
