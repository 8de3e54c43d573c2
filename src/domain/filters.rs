use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Per-symbol trading constraints, fetched fresh at the start of every run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeFilters {
    /// Smallest legal price increment
    pub tick_size: Decimal,
    /// Smallest legal quantity increment
    pub step_size: Decimal,
    /// Minimum price * quantity
    pub min_notional: Decimal,
    pub min_qty: Decimal,
    pub max_qty: Decimal,
}

impl ExchangeFilters {
    pub const DEFAULT_TICK_SIZE: Decimal = dec!(0.01);
    pub const DEFAULT_STEP_SIZE: Decimal = dec!(0.00001);
    pub const DEFAULT_MIN_NOTIONAL: Decimal = dec!(10);
    pub const DEFAULT_MIN_QTY: Decimal = Decimal::ZERO;
    pub const DEFAULT_MAX_QTY: Decimal = dec!(9999999);
}

impl Default for ExchangeFilters {
    fn default() -> Self {
        Self {
            tick_size: Self::DEFAULT_TICK_SIZE,
            step_size: Self::DEFAULT_STEP_SIZE,
            min_notional: Self::DEFAULT_MIN_NOTIONAL,
            min_qty: Self::DEFAULT_MIN_QTY,
            max_qty: Self::DEFAULT_MAX_QTY,
        }
    }
}

impl std::fmt::Display for ExchangeFilters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "tick={}, step={}, min_notional={}, qty=[{}, {}]",
            self.tick_size, self.step_size, self.min_notional, self.min_qty, self.max_qty
        )
    }
}
