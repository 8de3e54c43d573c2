//! Watch a resting buy order and reprice it when the market runs away.
//!
//! Each poll observes `(status, best ask)`. An ask above the active limit for
//! `intervals_before_reprice` consecutive polls triggers a cancel/replace at
//! the new ask, until `max_reprices` is spent; the next breach after that
//! cancels and gives up. FILLED ends the run, any status other than
//! NEW/PARTIALLY_FILLED ends it as a failure without touching the order.

use rust_decimal::Decimal;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::debug;

use super::events::{ExecutionEvent, ExecutionObserver};
use super::sizing::compute_limit_price;
use super::types::{OrderConfig, OrderResult};
use super::validation::validate_order;
use crate::domain::{ExchangeFilters, OrderStatus};
use crate::error::Result;
use crate::exchange::{ExchangeClient, LimitOrderRequest, OrderId};

/// Mutable bookkeeping for one monitoring session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorState {
    pub order_id: OrderId,
    pub limit_price: Decimal,
    pub reprices: u32,
    pub intervals_above: u32,
    pub checks: u64,
}

/// What the monitor does after one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    Filled,
    Unexpected(OrderStatus),
    /// Keep watching; `reset` is set when an above-limit streak just ended
    Hold { reset: bool },
    Reprice,
    Abandon,
}

impl MonitorState {
    pub fn new(order_id: OrderId, limit_price: Decimal) -> Self {
        Self {
            order_id,
            limit_price,
            reprices: 0,
            intervals_above: 0,
            checks: 0,
        }
    }

    /// Fold one poll into the state and decide the next step
    pub fn observe(
        &mut self,
        status: OrderStatus,
        ask: Decimal,
        config: &OrderConfig,
    ) -> MonitorAction {
        self.checks += 1;

        if status == OrderStatus::Filled {
            return MonitorAction::Filled;
        }

        if !status.is_working() {
            return MonitorAction::Unexpected(status);
        }

        if ask <= self.limit_price {
            let reset = self.intervals_above > 0;
            self.intervals_above = 0;
            return MonitorAction::Hold { reset };
        }

        self.intervals_above += 1;
        if self.intervals_above < config.intervals_before_reprice {
            return MonitorAction::Hold { reset: false };
        }

        if self.reprices >= config.max_reprices {
            MonitorAction::Abandon
        } else {
            MonitorAction::Reprice
        }
    }

    /// Swap in the replacement order
    pub fn record_reprice(&mut self, order_id: OrderId, limit_price: Decimal) {
        self.order_id = order_id;
        self.limit_price = limit_price;
        self.reprices += 1;
        self.intervals_above = 0;
    }

    /// Replacement could not be placed legally. The current order stays, but
    /// the attempt still spends one reprice so a stuck order ends in abandon.
    pub fn skip_reprice(&mut self) {
        self.reprices += 1;
        self.intervals_above = 0;
    }
}

/// Drives [`MonitorState`] against the exchange until a terminal outcome
pub struct RepriceMonitor<'a> {
    client: &'a dyn ExchangeClient,
    config: &'a OrderConfig,
    filters: &'a ExchangeFilters,
    observer: &'a dyn ExecutionObserver,
    shutdown: Option<watch::Receiver<bool>>,
}

impl<'a> RepriceMonitor<'a> {
    pub fn new(
        client: &'a dyn ExchangeClient,
        config: &'a OrderConfig,
        filters: &'a ExchangeFilters,
        observer: &'a dyn ExecutionObserver,
    ) -> Self {
        Self {
            client,
            config,
            filters,
            observer,
            shutdown: None,
        }
    }

    /// Stop between polls once the receiver reads `true`
    pub fn with_shutdown(mut self, shutdown: Option<watch::Receiver<bool>>) -> Self {
        self.shutdown = shutdown;
        self
    }

    pub async fn run(
        mut self,
        order_id: OrderId,
        quantity: Decimal,
        limit_price: Decimal,
    ) -> Result<OrderResult> {
        let config = self.config;
        let mut state = MonitorState::new(order_id, limit_price);

        self.observer.on_event(&ExecutionEvent::MonitoringStarted {
            poll_interval: config.poll_interval,
            intervals_before_reprice: config.intervals_before_reprice,
            max_reprices: config.max_reprices,
        });

        loop {
            if !self.pause().await {
                return Ok(self.interrupt(&state, quantity).await);
            }

            let status = self
                .client
                .get_order_status(&config.symbol, state.order_id)
                .await?;
            let ask = self.client.get_best_ask(&config.symbol).await?;

            let action = state.observe(status, ask, config);
            debug!(?action, check = state.checks, "monitor step");

            match action {
                MonitorAction::Filled => {
                    self.observer.on_event(&ExecutionEvent::Filled {
                        check: state.checks,
                        order_id: state.order_id,
                    });
                    return Ok(OrderResult::filled(
                        state.order_id,
                        quantity,
                        state.limit_price,
                        state.reprices,
                        "Order filled",
                    ));
                }
                MonitorAction::Unexpected(status) => {
                    self.observer.on_event(&ExecutionEvent::UnexpectedStatus {
                        check: state.checks,
                        order_id: state.order_id,
                        status,
                    });
                    return Ok(OrderResult::unexpected(
                        state.order_id,
                        status,
                        quantity,
                        state.limit_price,
                        state.reprices,
                    ));
                }
                MonitorAction::Hold { reset } => {
                    self.report_check(&state, status, ask, reset);
                }
                MonitorAction::Abandon => {
                    self.report_check(&state, status, ask, false);
                    self.client
                        .cancel_order(&config.symbol, state.order_id)
                        .await?;
                    self.observer.on_event(&ExecutionEvent::Abandoned {
                        order_id: state.order_id,
                        max_reprices: config.max_reprices,
                    });
                    return Ok(OrderResult::abandoned(
                        state.order_id,
                        quantity,
                        state.limit_price,
                        state.reprices,
                    ));
                }
                MonitorAction::Reprice => {
                    self.report_check(&state, status, ask, false);
                    self.reprice(&mut state, quantity, ask).await?;
                }
            }
        }
    }

    /// Cancel the active order and replace it just below `ask`
    async fn reprice(
        &self,
        state: &mut MonitorState,
        quantity: Decimal,
        ask: Decimal,
    ) -> Result<()> {
        let config = self.config;
        let new_price = compute_limit_price(ask, config.price_multiplier, self.filters);

        if let Err(violation) = validate_order(quantity, new_price, self.filters) {
            self.observer.on_event(&ExecutionEvent::ValidationFailed {
                reason: format!("Reprice to {} skipped: {}", new_price, violation),
            });
            state.skip_reprice();
            return Ok(());
        }

        let cancelled_order_id = state.order_id;
        self.client
            .cancel_order(&config.symbol, cancelled_order_id)
            .await?;

        let request = LimitOrderRequest::buy(
            config.symbol.clone(),
            quantity,
            new_price,
            config.time_in_force,
        );
        let placed = self.client.place_limit_order(&request).await?;

        state.record_reprice(placed.order_id, new_price);
        self.observer.on_event(&ExecutionEvent::Repriced {
            cancelled_order_id,
            order_id: placed.order_id,
            price: new_price,
            reprice: state.reprices,
            max_reprices: config.max_reprices,
        });

        Ok(())
    }

    fn report_check(&self, state: &MonitorState, status: OrderStatus, ask: Decimal, reset: bool) {
        self.observer.on_event(&ExecutionEvent::Checked {
            check: state.checks,
            status,
            limit: state.limit_price,
            ask,
            intervals_above: state.intervals_above,
            intervals_before_reprice: self.config.intervals_before_reprice,
            reset,
        });
    }

    /// Wait one poll interval; false when shutdown was requested
    async fn pause(&mut self) -> bool {
        let deadline = Instant::now() + self.config.poll_interval;

        loop {
            let Some(shutdown) = self.shutdown.as_mut() else {
                sleep_until(deadline).await;
                return true;
            };

            if *shutdown.borrow_and_update() {
                return false;
            }

            tokio::select! {
                _ = sleep_until(deadline) => return true,
                changed = shutdown.changed() => {
                    // Sender gone: nobody can request shutdown any more
                    if changed.is_err() {
                        self.shutdown = None;
                    }
                }
            }
        }
    }

    async fn interrupt(&self, state: &MonitorState, quantity: Decimal) -> OrderResult {
        if let Err(e) = self
            .client
            .cancel_order(&self.config.symbol, state.order_id)
            .await
        {
            self.observer.on_event(&ExecutionEvent::CancelFailed {
                order_id: state.order_id,
                reason: e.to_string(),
            });
        }
        self.observer.on_event(&ExecutionEvent::Interrupted {
            order_id: state.order_id,
        });

        OrderResult::interrupted(state.order_id, quantity, state.limit_price, state.reprices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TimeInForce;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn config(threshold: u32, max_reprices: u32) -> OrderConfig {
        OrderConfig {
            symbol: "BTCEUR".to_string(),
            spend_quote: dec!(100),
            price_multiplier: dec!(0.999),
            time_in_force: TimeInForce::GTC,
            poll_interval: Duration::ZERO,
            intervals_before_reprice: threshold,
            max_reprices,
        }
    }

    #[test]
    fn test_hysteresis_counts_consecutive_breaches() {
        let cfg = config(3, 2);
        let mut state = MonitorState::new(1, dec!(100));

        assert_eq!(
            state.observe(OrderStatus::New, dec!(101), &cfg),
            MonitorAction::Hold { reset: false }
        );
        assert_eq!(
            state.observe(OrderStatus::New, dec!(101), &cfg),
            MonitorAction::Hold { reset: false }
        );
        assert_eq!(state.intervals_above, 2);

        // Back at the limit: streak resets
        assert_eq!(
            state.observe(OrderStatus::New, dec!(100), &cfg),
            MonitorAction::Hold { reset: true }
        );
        assert_eq!(state.intervals_above, 0);

        state.observe(OrderStatus::PartiallyFilled, dec!(102), &cfg);
        state.observe(OrderStatus::PartiallyFilled, dec!(102), &cfg);
        assert_eq!(state.observe(OrderStatus::New, dec!(102), &cfg), MonitorAction::Reprice);
        assert_eq!(state.checks, 6);
    }

    #[test]
    fn test_reprice_resets_counter() {
        let cfg = config(1, 1);
        let mut state = MonitorState::new(1, dec!(100));

        assert_eq!(state.observe(OrderStatus::New, dec!(101), &cfg), MonitorAction::Reprice);
        state.record_reprice(2, dec!(100.89));
        assert_eq!(state.intervals_above, 0);
        assert_eq!(state.reprices, 1);
        assert_eq!(state.order_id, 2);

        // Budget spent: next breach abandons
        assert_eq!(state.observe(OrderStatus::New, dec!(102), &cfg), MonitorAction::Abandon);
    }

    #[test]
    fn test_terminal_statuses() {
        let cfg = config(5, 3);
        let mut state = MonitorState::new(1, dec!(100));
        assert_eq!(state.observe(OrderStatus::Filled, dec!(150), &cfg), MonitorAction::Filled);

        for status in [
            OrderStatus::Canceled,
            OrderStatus::Rejected,
            OrderStatus::Expired,
            OrderStatus::PendingCancel,
            OrderStatus::Unknown,
        ] {
            let mut state = MonitorState::new(1, dec!(100));
            assert_eq!(state.observe(status, dec!(99), &cfg), MonitorAction::Unexpected(status));
        }
    }

    #[test]
    fn test_zero_max_reprices_abandons_on_first_breach() {
        let cfg = config(2, 0);
        let mut state = MonitorState::new(1, dec!(100));
        state.observe(OrderStatus::New, dec!(101), &cfg);
        assert_eq!(state.observe(OrderStatus::New, dec!(101), &cfg), MonitorAction::Abandon);
    }

    #[test]
    fn test_skipped_reprice_spends_budget() {
        let cfg = config(1, 2);
        let mut state = MonitorState::new(1, dec!(100));

        assert_eq!(state.observe(OrderStatus::New, dec!(100.05), &cfg), MonitorAction::Reprice);
        state.skip_reprice();
        assert_eq!(state.reprices, 1);
        assert_eq!(state.intervals_above, 0);
        assert_eq!(state.order_id, 1);
        assert_eq!(state.limit_price, dec!(100));

        assert_eq!(state.observe(OrderStatus::New, dec!(100.05), &cfg), MonitorAction::Reprice);
        state.skip_reprice();
        assert_eq!(state.observe(OrderStatus::New, dec!(100.05), &cfg), MonitorAction::Abandon);
    }
}
