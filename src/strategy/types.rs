use rust_decimal::Decimal;
use serde::Serialize;
use std::time::Duration;

use crate::domain::{OrderStatus, TimeInForce};
use crate::error::{DcaError, Result};
use crate::exchange::OrderId;

/// Immutable per-run order parameters
#[derive(Debug, Clone, PartialEq)]
pub struct OrderConfig {
    pub symbol: String,
    /// Quote amount to spend (e.g. EUR)
    pub spend_quote: Decimal,
    /// Fraction of the best ask to bid at, in (0, 1)
    pub price_multiplier: Decimal,
    pub time_in_force: TimeInForce,
    pub poll_interval: Duration,
    /// Consecutive above-limit polls before repricing
    pub intervals_before_reprice: u32,
    pub max_reprices: u32,
}

impl OrderConfig {
    /// Reject values that make sizing meaningless
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.symbol.trim().is_empty() {
            errors.push("symbol must not be empty".to_string());
        }

        if self.spend_quote <= Decimal::ZERO {
            errors.push(format!(
                "spend amount must be positive, got {}",
                self.spend_quote
            ));
        }

        if self.price_multiplier <= Decimal::ZERO || self.price_multiplier >= Decimal::ONE {
            errors.push(format!(
                "price multiplier must be between 0 and 1, got {}",
                self.price_multiplier
            ));
        }

        if self.intervals_before_reprice == 0 {
            errors.push("intervals before reprice must be at least 1".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DcaError::Configuration(errors.join("; ")))
        }
    }
}

/// Terminal state a run ended in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionOutcome {
    /// Order filled
    Filled,
    /// Reprice budget exhausted, order cancelled
    Abandoned,
    /// Order left the NEW/PARTIALLY_FILLED states without filling
    Unexpected,
    /// Sized order failed local filter validation, nothing submitted
    Rejected,
    /// Dry run, nothing submitted
    Simulated,
    /// Shutdown requested while monitoring
    Interrupted,
}

impl ExecutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionOutcome::Filled => "FILLED",
            ExecutionOutcome::Abandoned => "ABANDONED",
            ExecutionOutcome::Unexpected => "FAILED",
            ExecutionOutcome::Rejected => "REJECTED",
            ExecutionOutcome::Simulated => "SIMULATED",
            ExecutionOutcome::Interrupted => "INTERRUPTED",
        }
    }
}

impl std::fmt::Display for ExecutionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of one DCA run, the only channel back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderResult {
    pub success: bool,
    pub filled: bool,
    pub order_id: Option<OrderId>,
    pub quantity: Option<Decimal>,
    pub price: Option<Decimal>,
    pub message: String,
    pub outcome: ExecutionOutcome,
    pub reprices: u32,
}

impl OrderResult {
    pub fn filled(
        order_id: OrderId,
        quantity: Decimal,
        price: Decimal,
        reprices: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: true,
            filled: true,
            order_id: Some(order_id),
            quantity: Some(quantity),
            price: Some(price),
            message: message.into(),
            outcome: ExecutionOutcome::Filled,
            reprices,
        }
    }

    pub fn simulated(quantity: Decimal, price: Decimal) -> Self {
        Self {
            success: true,
            filled: false,
            order_id: None,
            quantity: Some(quantity),
            price: Some(price),
            message: "Dry run - no order placed".to_string(),
            outcome: ExecutionOutcome::Simulated,
            reprices: 0,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            filled: false,
            order_id: None,
            quantity: None,
            price: None,
            message: reason.into(),
            outcome: ExecutionOutcome::Rejected,
            reprices: 0,
        }
    }

    pub fn abandoned(order_id: OrderId, quantity: Decimal, price: Decimal, reprices: u32) -> Self {
        Self {
            success: true,
            filled: false,
            order_id: Some(order_id),
            quantity: Some(quantity),
            price: Some(price),
            message: "Max reprices reached".to_string(),
            outcome: ExecutionOutcome::Abandoned,
            reprices,
        }
    }

    pub fn unexpected(
        order_id: OrderId,
        status: OrderStatus,
        quantity: Decimal,
        price: Decimal,
        reprices: u32,
    ) -> Self {
        Self {
            success: false,
            filled: false,
            order_id: Some(order_id),
            quantity: Some(quantity),
            price: Some(price),
            message: format!("Unexpected status: {}", status),
            outcome: ExecutionOutcome::Unexpected,
            reprices,
        }
    }

    pub fn interrupted(
        order_id: OrderId,
        quantity: Decimal,
        price: Decimal,
        reprices: u32,
    ) -> Self {
        Self {
            success: false,
            filled: false,
            order_id: Some(order_id),
            quantity: Some(quantity),
            price: Some(price),
            message: "Monitoring interrupted by shutdown".to_string(),
            outcome: ExecutionOutcome::Interrupted,
            reprices,
        }
    }
}
