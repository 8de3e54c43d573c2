use rust_decimal::Decimal;

use super::rounding::{round_down, round_to_tick};
use crate::domain::ExchangeFilters;

/// Limit price and quantity derived from one best-ask observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizedOrder {
    pub best_ask: Decimal,
    pub raw_price: Decimal,
    pub limit_price: Decimal,
    pub raw_quantity: Decimal,
    pub quantity: Decimal,
}

impl SizedOrder {
    pub fn notional(&self) -> Decimal {
        self.quantity * self.limit_price
    }
}

/// `best_ask * multiplier`, rounded down to the tick
pub fn compute_limit_price(
    best_ask: Decimal,
    multiplier: Decimal,
    filters: &ExchangeFilters,
) -> Decimal {
    round_to_tick(best_ask * multiplier, filters.tick_size)
}

/// `spend / price`, rounded down to the lot step.
///
/// A non-positive price yields zero, which validation then rejects.
pub fn compute_quantity(spend: Decimal, price: Decimal, filters: &ExchangeFilters) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    match spend.checked_div(price) {
        Some(raw) => round_down(raw, filters.step_size),
        None => Decimal::ZERO,
    }
}

/// Size a buy for `spend` quote units just below `best_ask`
pub fn size_order(
    best_ask: Decimal,
    spend: Decimal,
    multiplier: Decimal,
    filters: &ExchangeFilters,
) -> SizedOrder {
    let raw_price = best_ask * multiplier;
    let limit_price = compute_limit_price(best_ask, multiplier, filters);
    let raw_quantity = if limit_price > Decimal::ZERO {
        spend.checked_div(limit_price).unwrap_or(Decimal::ZERO)
    } else {
        Decimal::ZERO
    };
    let quantity = compute_quantity(spend, limit_price, filters);

    SizedOrder {
        best_ask,
        raw_price,
        limit_price,
        raw_quantity,
        quantity,
    }
}
