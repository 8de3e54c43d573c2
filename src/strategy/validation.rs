use rust_decimal::Decimal;
use thiserror::Error;

use crate::domain::ExchangeFilters;

/// Why a sized order would be refused by the exchange's own filters
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FilterViolation {
    #[error("Limit price {price} must be positive")]
    NonPositivePrice { price: Decimal },

    #[error("Quantity {quantity} must be positive")]
    NonPositiveQuantity { quantity: Decimal },

    #[error("Quantity {quantity} below min {min_qty}")]
    BelowMinQty { quantity: Decimal, min_qty: Decimal },

    #[error("Quantity {quantity} exceeds max {max_qty}")]
    AboveMaxQty { quantity: Decimal, max_qty: Decimal },

    #[error("Notional {notional} below min {min_notional}. Increase the spend amount.")]
    BelowMinNotional {
        notional: Decimal,
        min_notional: Decimal,
    },
}

/// Check a candidate order against the symbol's filters; first failure wins.
pub fn validate_order(
    quantity: Decimal,
    price: Decimal,
    filters: &ExchangeFilters,
) -> Result<(), FilterViolation> {
    if price <= Decimal::ZERO {
        return Err(FilterViolation::NonPositivePrice { price });
    }

    if quantity <= Decimal::ZERO {
        return Err(FilterViolation::NonPositiveQuantity { quantity });
    }

    if quantity < filters.min_qty {
        return Err(FilterViolation::BelowMinQty {
            quantity,
            min_qty: filters.min_qty,
        });
    }

    if quantity > filters.max_qty {
        return Err(FilterViolation::AboveMaxQty {
            quantity,
            max_qty: filters.max_qty,
        });
    }

    let notional = quantity * price;
    if notional < filters.min_notional {
        return Err(FilterViolation::BelowMinNotional {
            notional,
            min_notional: filters.min_notional,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn filters() -> ExchangeFilters {
        ExchangeFilters {
            tick_size: dec!(0.01),
            step_size: dec!(0.00001),
            min_notional: dec!(5),
            min_qty: dec!(0.0001),
            max_qty: dec!(9000),
        }
    }

    #[test]
    fn test_valid_order_passes() {
        assert_eq!(validate_order(dec!(0.00333), dec!(29970.00), &filters()), Ok(()));
    }

    #[test]
    fn test_min_qty_rejection_names_bound() {
        let err = validate_order(dec!(0.00005), dec!(29970.00), &filters()).unwrap_err();
        assert!(matches!(err, FilterViolation::BelowMinQty { .. }));
        assert_eq!(err.to_string(), "Quantity 0.00005 below min 0.0001");
    }

    #[test]
    fn test_max_qty_rejection() {
        let err = validate_order(dec!(9000.5), dec!(1), &filters()).unwrap_err();
        assert_eq!(err.to_string(), "Quantity 9000.5 exceeds max 9000");
    }

    #[test]
    fn test_min_notional_rejection() {
        // 0.0001 * 29970 = 2.997 < 5
        let err = validate_order(dec!(0.0001), dec!(29970), &filters()).unwrap_err();
        match err {
            FilterViolation::BelowMinNotional { notional, min_notional } => {
                assert_eq!(notional, dec!(2.997));
                assert_eq!(min_notional, dec!(5));
            }
            other => panic!("unexpected violation: {other}"),
        }
    }

    #[test]
    fn test_check_order_first_failure_wins() {
        // Below min qty AND below min notional: the qty check is reported
        let err = validate_order(dec!(0.00001), dec!(1), &filters()).unwrap_err();
        assert!(matches!(err, FilterViolation::BelowMinQty { .. }));
    }

    #[test]
    fn test_zero_price_and_quantity_rejected() {
        let mut lenient = filters();
        lenient.min_qty = Decimal::ZERO;
        lenient.min_notional = Decimal::ZERO;

        assert!(matches!(
            validate_order(dec!(1), Decimal::ZERO, &lenient),
            Err(FilterViolation::NonPositivePrice { .. })
        ));
        assert!(matches!(
            validate_order(Decimal::ZERO, dec!(1), &lenient),
            Err(FilterViolation::NonPositiveQuantity { .. })
        ));
    }
}
