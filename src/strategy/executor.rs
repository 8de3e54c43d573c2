use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, instrument};

use super::events::{ExecutionEvent, ExecutionObserver, NoopObserver};
use super::monitor::RepriceMonitor;
use super::sizing::size_order;
use super::types::{OrderConfig, OrderResult};
use super::validation::validate_order;
use crate::domain::OrderStatus;
use crate::error::Result;
use crate::exchange::{ExchangeClient, LimitOrderRequest};

/// Places one DCA limit buy and sees it through to a terminal outcome
pub struct DcaExecutor {
    client: Arc<dyn ExchangeClient>,
    observer: Arc<dyn ExecutionObserver>,
    shutdown: Option<watch::Receiver<bool>>,
}

impl DcaExecutor {
    /// Create a new executor with no observer and no shutdown signal
    pub fn new(client: Arc<dyn ExchangeClient>) -> Self {
        Self {
            client,
            observer: Arc::new(NoopObserver),
            shutdown: None,
        }
    }

    /// Set the execution event sink
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Allow monitoring to stop between polls once `shutdown` reads `true`
    pub fn with_shutdown(mut self, shutdown: watch::Receiver<bool>) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    /// Execute a DCA buy.
    ///
    /// Fetches filters and the best ask, sizes a limit order just below the
    /// ask, and either reports it (`simulate`) or places it and monitors it.
    /// Configuration and exchange failures are returned as errors; every
    /// other ending is an [`OrderResult`].
    #[instrument(skip(self, config), fields(symbol = %config.symbol))]
    pub async fn execute(&self, config: &OrderConfig, simulate: bool) -> Result<OrderResult> {
        config.validate()?;

        let filters = self.client.get_exchange_filters(&config.symbol).await?;
        self.observer.on_event(&ExecutionEvent::FiltersLoaded {
            symbol: config.symbol.clone(),
            filters,
        });

        let best_ask = self.client.get_best_ask(&config.symbol).await?;
        self.observer.on_event(&ExecutionEvent::BestAsk { ask: best_ask });

        let sized = size_order(
            best_ask,
            config.spend_quote,
            config.price_multiplier,
            &filters,
        );
        self.observer.on_event(&ExecutionEvent::OrderSized {
            best_ask,
            multiplier: config.price_multiplier,
            raw_price: sized.raw_price,
            limit_price: sized.limit_price,
            spend: config.spend_quote,
            raw_quantity: sized.raw_quantity,
            quantity: sized.quantity,
        });

        if let Err(violation) = validate_order(sized.quantity, sized.limit_price, &filters) {
            let reason = violation.to_string();
            self.observer.on_event(&ExecutionEvent::ValidationFailed {
                reason: reason.clone(),
            });
            return Ok(OrderResult::rejected(reason));
        }

        if simulate {
            self.observer.on_event(&ExecutionEvent::Simulated {
                symbol: config.symbol.clone(),
                quantity: sized.quantity,
                price: sized.limit_price,
                time_in_force: config.time_in_force,
            });
            return Ok(OrderResult::simulated(sized.quantity, sized.limit_price));
        }

        let request = LimitOrderRequest::buy(
            config.symbol.clone(),
            sized.quantity,
            sized.limit_price,
            config.time_in_force,
        );
        let placed = self.client.place_limit_order(&request).await?;
        debug!(order_id = placed.order_id, status = %placed.status, "limit order accepted");

        self.observer.on_event(&ExecutionEvent::OrderPlaced {
            order_id: placed.order_id,
            status: placed.status,
            price: sized.limit_price,
            quantity: sized.quantity,
        });

        if placed.status == OrderStatus::Filled {
            return Ok(OrderResult::filled(
                placed.order_id,
                sized.quantity,
                sized.limit_price,
                0,
                "Filled immediately",
            ));
        }

        RepriceMonitor::new(
            self.client.as_ref(),
            config,
            &filters,
            self.observer.as_ref(),
        )
        .with_shutdown(self.shutdown.clone())
        .run(placed.order_id, sized.quantity, sized.limit_price)
        .await
    }
}
