//! One scheduled DCA run: weekly guard, execution, and order history.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Utc};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Order, OrderSide};
use crate::error::Result;
use crate::persistence::OrderRepository;
use crate::strategy::{DcaExecutor, ExecutionOutcome, OrderConfig, OrderResult};

/// What a run ended up doing
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// This week's buy already filled
    Skipped { last_order: Order },
    Executed(OrderResult),
}

impl RunOutcome {
    /// Skips count as success
    pub fn is_success(&self) -> bool {
        match self {
            RunOutcome::Skipped { .. } => true,
            RunOutcome::Executed(result) => result.success,
        }
    }
}

/// True when `order` was created in the same ISO week as `now`
pub fn is_same_week(order: Option<&Order>, now: DateTime<Utc>) -> bool {
    order.is_some_and(|o| o.created_at.iso_week() == now.iso_week())
}

/// Wraps the executor with the account's order history
pub struct DcaService {
    executor: DcaExecutor,
    repository: Option<Arc<dyn OrderRepository>>,
    account: String,
}

impl DcaService {
    pub fn new(executor: DcaExecutor, account: impl Into<String>) -> Self {
        Self {
            executor,
            repository: None,
            account: account.into(),
        }
    }

    /// Enable the weekly guard and order recording
    pub fn with_repository(mut self, repository: Arc<dyn OrderRepository>) -> Self {
        self.repository = Some(repository);
        self
    }

    #[instrument(skip(self, config), fields(account = %self.account, symbol = %config.symbol))]
    pub async fn run(
        &self,
        config: &OrderConfig,
        simulate: bool,
        force: bool,
    ) -> Result<RunOutcome> {
        self.run_at(config, simulate, force, Utc::now()).await
    }

    /// [`run`](Self::run) with an explicit clock for the weekly guard
    pub async fn run_at(
        &self,
        config: &OrderConfig,
        simulate: bool,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<RunOutcome> {
        let user_id = match &self.repository {
            Some(repo) => Some(repo.get_or_create_user(&self.account).await?),
            None => None,
        };

        if let (Some(repo), Some(user_id)) = (&self.repository, user_id) {
            let last = repo
                .get_last_order(user_id, &config.symbol, OrderSide::Buy)
                .await?;

            match last {
                Some(last) if last.is_filled() && is_same_week(Some(&last), now) => {
                    if force {
                        warn!(
                            "Already bought {} this week ({}), forcing another buy",
                            config.symbol, last.created_at
                        );
                    } else {
                        info!(
                            "Already bought {} this week at {} ({}), skipping",
                            config.symbol, last.price, last.created_at
                        );
                        return Ok(RunOutcome::Skipped { last_order: last });
                    }
                }
                _ => {}
            }
        }

        let result = self.executor.execute(config, simulate).await?;

        // a failed history write is logged, the exchange result is still returned
        if let (Some(repo), Some(user_id)) = (&self.repository, user_id) {
            if !simulate {
                if let Some(order) = Self::order_record(user_id, config, &result, now) {
                    match repo.add_order(&order).await {
                        Ok(id) => info!("Recorded {} order {}", order.status, id),
                        Err(e) => error!(
                            "Failed to record {} order {:?}: {}",
                            order.status, result.order_id, e
                        ),
                    }
                }
            }
        }

        Ok(RunOutcome::Executed(result))
    }

    /// History row for results that reached the exchange
    fn order_record(
        user_id: Uuid,
        config: &OrderConfig,
        result: &OrderResult,
        now: DateTime<Utc>,
    ) -> Option<Order> {
        if matches!(
            result.outcome,
            ExecutionOutcome::Rejected | ExecutionOutcome::Simulated
        ) {
            return None;
        }
        result.order_id?;

        Some(Order {
            id: None,
            user_id,
            symbol: config.symbol.clone(),
            side: OrderSide::Buy,
            price: result.price?,
            quantity: result.quantity?,
            multiplier: config.price_multiplier,
            reprices: result.reprices,
            status: result.outcome.as_str().to_string(),
            created_at: now,
        })
    }
}
