#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use crypto_dca::domain::{ExchangeFilters, OrderStatus, TimeInForce};
use crypto_dca::error::ExchangeError;
use crypto_dca::exchange::{ExchangeClient, LimitOrderRequest, OrderId, PlacedOrder};
use crypto_dca::strategy::{ExecutionEvent, ExecutionObserver, OrderConfig};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Exchange call as seen by the fake
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Filters,
    Ask,
    Place(LimitOrderRequest),
    Status(OrderId),
    Cancel(OrderId),
}

/// Exchange that answers from fixed queues and records every call.
///
/// Asks are consumed by every `get_best_ask` (the sizing fetch included),
/// statuses by every `get_order_status`. An exhausted queue answers with a
/// transport error so a runaway loop fails the test instead of hanging.
pub struct ScriptedExchange {
    filters: ExchangeFilters,
    asks: Mutex<VecDeque<Decimal>>,
    statuses: Mutex<VecDeque<OrderStatus>>,
    place_status: OrderStatus,
    next_order_id: Mutex<OrderId>,
    fail_cancel: bool,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedExchange {
    pub fn new(asks: &[Decimal], statuses: &[OrderStatus]) -> Self {
        Self {
            filters: btc_eur_filters(),
            asks: Mutex::new(asks.iter().copied().collect()),
            statuses: Mutex::new(statuses.iter().copied().collect()),
            place_status: OrderStatus::New,
            next_order_id: Mutex::new(1000),
            fail_cancel: false,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_filters(mut self, filters: ExchangeFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_place_status(mut self, status: OrderStatus) -> Self {
        self.place_status = status;
        self
    }

    pub fn with_failing_cancel(mut self) -> Self {
        self.fail_cancel = true;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn placed(&self) -> Vec<LimitOrderRequest> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Place(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn cancelled(&self) -> Vec<OrderId> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Cancel(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ExchangeClient for ScriptedExchange {
    async fn get_exchange_filters(&self, _symbol: &str) -> Result<ExchangeFilters, ExchangeError> {
        self.record(Call::Filters);
        Ok(self.filters)
    }

    async fn get_best_ask(&self, _symbol: &str) -> Result<Decimal, ExchangeError> {
        self.record(Call::Ask);
        self.asks
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ExchangeError::network("ask script exhausted"))
    }

    async fn place_limit_order(
        &self,
        request: &LimitOrderRequest,
    ) -> Result<PlacedOrder, ExchangeError> {
        self.record(Call::Place(request.clone()));
        let mut next = self.next_order_id.lock().unwrap();
        let order_id = *next;
        *next += 1;
        Ok(PlacedOrder {
            order_id,
            status: self.place_status,
        })
    }

    async fn get_order_status(
        &self,
        _symbol: &str,
        order_id: OrderId,
    ) -> Result<OrderStatus, ExchangeError> {
        self.record(Call::Status(order_id));
        self.statuses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| ExchangeError::network("status script exhausted"))
    }

    async fn cancel_order(
        &self,
        _symbol: &str,
        order_id: OrderId,
    ) -> Result<OrderStatus, ExchangeError> {
        self.record(Call::Cancel(order_id));
        if self.fail_cancel {
            return Err(ExchangeError::new(400, Some(-2011), "Unknown order sent."));
        }
        Ok(OrderStatus::Canceled)
    }
}

/// Keeps every event for later assertions
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ExecutionEvent>>,
}

impl RecordingObserver {
    pub fn events(&self) -> Vec<ExecutionEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ExecutionObserver for RecordingObserver {
    fn on_event(&self, event: &ExecutionEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

pub fn btc_eur_filters() -> ExchangeFilters {
    ExchangeFilters {
        tick_size: dec!(0.01),
        step_size: dec!(0.00001),
        min_notional: dec!(5),
        min_qty: dec!(0.00001),
        max_qty: dec!(9000),
    }
}

pub fn order_config(intervals_before_reprice: u32, max_reprices: u32) -> OrderConfig {
    OrderConfig {
        symbol: "BTCEUR".to_string(),
        spend_quote: dec!(100),
        price_multiplier: dec!(0.999),
        time_in_force: TimeInForce::GTC,
        poll_interval: Duration::ZERO,
        intervals_before_reprice,
        max_reprices,
    }
}
