//! Exact-decimal quantization to exchange ticks and lot steps.

use rust_decimal::Decimal;

/// Floor `value` to the nearest multiple of `step` at or below it.
///
/// A non-positive step disables quantization and returns `value` unchanged.
pub fn round_down(value: Decimal, step: Decimal) -> Decimal {
    if step <= Decimal::ZERO {
        return value;
    }
    (value / step).floor() * step
}

/// Quantize a buy price to `tick`, rounding down so the limit never exceeds
/// the budget-derived price.
pub fn round_to_tick(price: Decimal, tick: Decimal) -> Decimal {
    round_down(price, tick)
}
