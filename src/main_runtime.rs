use std::sync::Arc;

use crypto_dca::adapters::PostgresStore;
use crypto_dca::config::{DatabaseConfig, LoggingConfig};
use crypto_dca::error::Result;
use crypto_dca::persistence::OrderRepository;
use crypto_dca::services::RunOutcome;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Console logging plus an optional daily rotating file. The returned guard
/// must outlive the run or buffered file lines are lost.
pub fn init_logging(logging: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "{},crypto_dca={},sqlx=warn",
            logging.level, logging.level
        ))
    });

    // `rolling::daily` panics if it cannot create the first file, so check writability first.
    let (file_layer, guard) = match logging.dir.as_deref() {
        Some(dir) => match preflight_log_dir(dir) {
            Ok(()) => {
                let file_appender = tracing_appender::rolling::daily(dir, "crypto-dca.log");
                let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
                let layer = tracing_subscriber::fmt::layer()
                    .with_writer(non_blocking)
                    .with_ansi(false)
                    .with_target(true);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not write to log directory {} ({}), file logging disabled",
                    dir, e
                );
                (None, None)
            }
        },
        None => (None, None),
    };

    let (json_layer, console_layer) = if logging.json {
        (
            Some(tracing_subscriber::fmt::layer().json().with_target(true)),
            None,
        )
    } else {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            ),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .with(file_layer)
        .init();

    if guard.is_some() {
        if let Some(dir) = &logging.dir {
            info!("Logging to: {}/crypto-dca.log", dir);
        }
    }

    guard
}

fn preflight_log_dir(dir: &str) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let test_path = std::path::Path::new(dir).join(".crypto_dca_write_test");
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&test_path)?;
    let _ = std::fs::remove_file(&test_path);
    Ok(())
}

/// Open the order history database, if one is configured
pub async fn open_repository(
    database: &DatabaseConfig,
) -> Result<Option<Arc<dyn OrderRepository>>> {
    let Some(url) = database.url.as_deref() else {
        warn!("No database configured, weekly guard and order history disabled");
        return Ok(None);
    };

    let store = PostgresStore::new(url, database.max_connections).await?;
    store.migrate().await?;
    Ok(Some(Arc::new(store)))
}

/// Flip `tx` to `true` on Ctrl+C or SIGTERM
pub fn spawn_shutdown_listener(tx: watch::Sender<bool>) {
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Shutdown requested, stopping after the current check");
        let _ = tx.send(true);
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => error!("Failed to install SIGTERM handler: {}", e),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Final banner for the run
pub fn report(outcome: &RunOutcome) {
    const BAR: &str = "==================================================";

    info!("{}", BAR);
    match outcome {
        RunOutcome::Skipped { last_order } => {
            info!(
                "SKIPPED: {} {} @ {} already filled this week ({})",
                last_order.quantity, last_order.symbol, last_order.price, last_order.created_at
            );
        }
        RunOutcome::Executed(result) if result.filled => {
            info!("SUCCESS: {}", result.message);
            if let (Some(q), Some(p)) = (result.quantity, result.price) {
                info!("Bought {} @ {} (reprices: {})", q, p, result.reprices);
            }
        }
        RunOutcome::Executed(result) if result.success => {
            info!("COMPLETE: {}", result.message);
        }
        RunOutcome::Executed(result) => {
            error!("FAILED: {}", result.message);
        }
    }
    if let RunOutcome::Executed(result) = outcome {
        if let Some(id) = result.order_id {
            info!("Order ID: {}", id);
        }
    }
    info!("{}", BAR);
}
