use clap::Parser;
use crypto_dca::cli::Cli;
use crypto_dca::config::AppConfig;
use crypto_dca::error::{DcaError, Result};
use crypto_dca::exchange::build_exchange_client;
use crypto_dca::services::{DcaService, RunOutcome};
use crypto_dca::strategy::{DcaExecutor, TracingObserver};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info};

mod main_runtime;

use main_runtime::{init_logging, open_repository, report, spawn_shutdown_listener};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut app_config = match AppConfig::load_from(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", cli.config, e);
            std::process::exit(DcaError::from(e).exit_code());
        }
    };
    cli.apply(&mut app_config);

    let guard = init_logging(&app_config.logging);

    let code = match run(&cli, &app_config).await {
        Ok(outcome) => {
            report(&outcome);
            if outcome.is_success() {
                0
            } else {
                1
            }
        }
        Err(e) => {
            error!("{}", e);
            e.exit_code()
        }
    };

    // Flush the file appender before exiting
    drop(guard);
    std::process::exit(code);
}

async fn run(cli: &Cli, app_config: &AppConfig) -> Result<RunOutcome> {
    let order_config = app_config.order_config()?;
    let dry_run = app_config.dry_run;

    info!(
        "DCA buy: {} {} of {} at {} x ask (TIF {}){}",
        order_config.spend_quote,
        quote_label(&order_config.symbol),
        order_config.symbol,
        order_config.price_multiplier,
        order_config.time_in_force,
        if dry_run { " [DRY RUN]" } else { "" }
    );

    let client = build_exchange_client(app_config, dry_run)?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    spawn_shutdown_listener(shutdown_tx);

    let executor = DcaExecutor::new(client)
        .with_observer(Arc::new(TracingObserver))
        .with_shutdown(shutdown_rx);

    let mut service = DcaService::new(executor, app_config.account.clone());
    if let Some(repository) = open_repository(&app_config.database).await? {
        service = service.with_repository(repository);
    }

    service.run(&order_config, dry_run, cli.force).await
}

/// Quote asset for log lines, e.g. `EUR` for `BTCEUR`
fn quote_label(symbol: &str) -> &str {
    const QUOTES: [&str; 6] = ["USDT", "USDC", "FDUSD", "EUR", "BTC", "ETH"];
    QUOTES
        .iter()
        .find(|q| symbol.len() > q.len() && symbol.ends_with(*q))
        .copied()
        .unwrap_or("quote")
}
