use std::sync::Arc;

use async_trait::async_trait;
use crypto_dca::domain::{ExchangeFilters, OrderStatus, TimeInForce};
use crypto_dca::error::ExchangeError;
use crypto_dca::exchange::{ExchangeClient, LimitOrderRequest, OrderId, PlacedOrder};
use crypto_dca::strategy::{DcaExecutor, ExecutionOutcome, OrderConfig};
use mockall::mock;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::time::Duration;

mock! {
    pub Exchange {}

    #[async_trait]
    impl ExchangeClient for Exchange {
        async fn get_exchange_filters(
            &self,
            symbol: &str,
        ) -> Result<ExchangeFilters, ExchangeError>;
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
}

fn config() -> OrderConfig {
    OrderConfig {
        symbol: "BTCEUR".to_string(),
        spend_quote: dec!(100),
        price_multiplier: dec!(0.999),
        time_in_force: TimeInForce::GTC,
        poll_interval: Duration::ZERO,
        intervals_before_reprice: 5,
        max_reprices: 3,
    }
}

fn read_only_exchange(ask: Decimal) -> MockExchange {
    let mut exchange = MockExchange::new();
    exchange
        .expect_get_exchange_filters()
        .times(1)
        .returning(|_| Ok(ExchangeFilters::default()));
    exchange
        .expect_get_best_ask()
        .times(1)
        .returning(move |_| Ok(ask));
    exchange.expect_place_limit_order().never();
    exchange.expect_get_order_status().never();
    exchange.expect_cancel_order().never();
    exchange
}

#[tokio::test]
async fn simulation_sizes_without_mutating() {
    let executor = DcaExecutor::new(Arc::new(read_only_exchange(dec!(30000))));

    let result = executor.execute(&config(), true).await.unwrap();

    assert!(result.success);
    assert!(!result.filled);
    assert_eq!(result.outcome, ExecutionOutcome::Simulated);
    assert_eq!(result.message, "Dry run - no order placed");
    assert!(result.order_id.is_none());
    assert_eq!(result.price, Some(dec!(29970.00)));
    assert_eq!(result.quantity, Some(dec!(0.00333)));
}

#[tokio::test]
async fn simulation_still_reports_validation_failure() {
    let executor = DcaExecutor::new(Arc::new(read_only_exchange(dec!(30000))));

    let mut config = config();
    config.spend_quote = dec!(5);

    let result = executor.execute(&config, true).await.unwrap();

    assert!(!result.success);
    assert_eq!(result.outcome, ExecutionOutcome::Rejected);
    assert!(result.message.starts_with("Notional"));
    assert!(result.message.ends_with("Increase the spend amount."));
}

#[tokio::test]
async fn unknown_symbol_is_not_found() {
    let mut exchange = MockExchange::new();
    exchange
        .expect_get_exchange_filters()
        .returning(|symbol| Err(ExchangeError::not_found(format!("Symbol {symbol} not found"))));
    exchange.expect_get_best_ask().never();

    let executor = DcaExecutor::new(Arc::new(exchange));
    let err = executor.execute(&config(), true).await.unwrap_err();

    match err {
        crypto_dca::DcaError::Exchange(e) => {
            assert!(e.is_not_found());
            assert!(e.message.contains("BTCEUR"));
        }
        other => panic!("expected exchange error, got {other:?}"),
    }
}
