//! Structured execution events and the observers that consume them.
//!
//! The executor never logs directly; it reports what happened through an
//! [`ExecutionObserver`]. [`NoopObserver`] is the default, [`TracingObserver`]
//! renders events as log lines.

use rust_decimal::Decimal;
use std::time::Duration;
use tracing::{info, warn};

use crate::domain::{ExchangeFilters, OrderStatus, TimeInForce};
use crate::exchange::OrderId;

#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionEvent {
    FiltersLoaded {
        symbol: String,
        filters: ExchangeFilters,
    },
    BestAsk {
        ask: Decimal,
    },
    OrderSized {
        best_ask: Decimal,
        multiplier: Decimal,
        raw_price: Decimal,
        limit_price: Decimal,
        spend: Decimal,
        raw_quantity: Decimal,
        quantity: Decimal,
    },
    ValidationFailed {
        reason: String,
    },
    Simulated {
        symbol: String,
        quantity: Decimal,
        price: Decimal,
        time_in_force: TimeInForce,
    },
    OrderPlaced {
        order_id: OrderId,
        status: OrderStatus,
        price: Decimal,
        quantity: Decimal,
    },
    MonitoringStarted {
        poll_interval: Duration,
        intervals_before_reprice: u32,
        max_reprices: u32,
    },
    Checked {
        check: u64,
        status: OrderStatus,
        limit: Decimal,
        ask: Decimal,
        intervals_above: u32,
        intervals_before_reprice: u32,
        reset: bool,
    },
    Repriced {
        cancelled_order_id: OrderId,
        order_id: OrderId,
        price: Decimal,
        reprice: u32,
        max_reprices: u32,
    },
    Filled {
        check: u64,
        order_id: OrderId,
    },
    Abandoned {
        order_id: OrderId,
        max_reprices: u32,
    },
    UnexpectedStatus {
        check: u64,
        order_id: OrderId,
        status: OrderStatus,
    },
    Interrupted {
        order_id: OrderId,
    },
    CancelFailed {
        order_id: OrderId,
        reason: String,
    },
}

/// Sink for execution events
pub trait ExecutionObserver: Send + Sync {
    fn on_event(&self, event: &ExecutionEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {
    fn on_event(&self, _event: &ExecutionEvent) {}
}

/// Writes events to the `tracing` subscriber
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ExecutionObserver for TracingObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        match event {
            ExecutionEvent::FiltersLoaded { symbol, filters } => {
                info!("Filters for {}: {}", symbol, filters);
            }
            ExecutionEvent::BestAsk { ask } => info!("Best ask: {}", ask),
            ExecutionEvent::OrderSized {
                best_ask,
                multiplier,
                raw_price,
                limit_price,
                spend,
                raw_quantity,
                quantity,
            } => {
                info!(
                    "Limit price: {} * {} = {} -> {}",
                    best_ask, multiplier, raw_price, limit_price
                );
                info!(
                    "Quantity: {} / {} = {} -> {}",
                    spend, limit_price, raw_quantity, quantity
                );
                info!(
                    "Order: {} @ {} = {} notional",
                    quantity,
                    limit_price,
                    quantity * limit_price
                );
            }
            ExecutionEvent::ValidationFailed { reason } => {
                warn!("Order rejected before submission: {}", reason);
            }
            ExecutionEvent::Simulated {
                symbol,
                quantity,
                price,
                time_in_force,
            } => {
                info!("{}", "=".repeat(60));
                info!("DRY RUN - would place:");
                info!(
                    "  {} BUY LIMIT {} @ {} ({})",
                    symbol, quantity, price, time_in_force
                );
                info!("  Notional: {}", quantity * price);
                info!("{}", "=".repeat(60));
            }
            ExecutionEvent::OrderPlaced {
                order_id, status, ..
            } => {
                info!("Order placed: id={}, status={}", order_id, status);
            }
            ExecutionEvent::MonitoringStarted {
                poll_interval,
                intervals_before_reprice,
                max_reprices,
            } => {
                info!(
                    "Monitoring (poll={}s, reprice after {}, max {} reprices)",
                    poll_interval.as_secs(),
                    intervals_before_reprice,
                    max_reprices
                );
            }
            ExecutionEvent::Checked {
                check,
                status,
                limit,
                ask,
                intervals_above,
                intervals_before_reprice,
                reset,
            } => {
                let suffix = if *intervals_above > 0 {
                    let mut s = format!("Above ({}/{})", intervals_above, intervals_before_reprice);
                    if intervals_above >= intervals_before_reprice {
                        s.push_str(" -> Repricing");
                    }
                    s
                } else if *reset {
                    "OK (reset)".to_string()
                } else {
                    "OK".to_string()
                };
                info!(
                    "[{}] {} | Limit: {} | Ask: {} | {}",
                    check, status, limit, ask, suffix
                );
            }
            ExecutionEvent::Repriced {
                order_id,
                price,
                reprice,
                max_reprices,
                ..
            } => {
                info!(
                    "New order {} @ {} (reprice {}/{})",
                    order_id, price, reprice, max_reprices
                );
            }
            ExecutionEvent::Filled { check, order_id } => {
                info!("[{}] FILLED (order {})", check, order_id);
            }
            ExecutionEvent::Abandoned {
                order_id,
                max_reprices,
            } => {
                info!(
                    "Max reprices ({}) reached, giving up on order {}",
                    max_reprices, order_id
                );
            }
            ExecutionEvent::UnexpectedStatus {
                check,
                order_id,
                status,
            } => {
                warn!("[{}] Unexpected status for order {}: {}", check, order_id, status);
            }
            ExecutionEvent::Interrupted { order_id } => {
                warn!("Monitoring of order {} interrupted by shutdown", order_id);
            }
            ExecutionEvent::CancelFailed { order_id, reason } => {
                warn!("Failed to cancel order {}: {}", order_id, reason);
            }
        }
    }
}
