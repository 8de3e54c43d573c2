use std::sync::Arc;

use tracing::warn;

use crate::adapters::BinanceClient;
use crate::config::AppConfig;
use crate::error::Result;
use crate::signing::{ApiCredentials, QuerySigner};

use super::ExchangeClient;

/// Create the runtime exchange client from `AppConfig`.
///
/// Live runs require `BINANCE_API_KEY`/`BINANCE_API_SECRET`. Dry runs only hit
/// public endpoints, so missing credentials are tolerated there.
pub fn build_exchange_client(
    app_config: &AppConfig,
    dry_run: bool,
) -> Result<Arc<dyn ExchangeClient>> {
    let signer = match ApiCredentials::from_env() {
        Ok(credentials) => Some(QuerySigner::new(credentials)),
        Err(e) if dry_run => {
            warn!("No API credentials ({}), using public endpoints only", e);
            None
        }
        Err(e) => return Err(e),
    };

    let client = BinanceClient::new(
        Some(&app_config.exchange.base_url),
        signer,
        app_config.exchange.recv_window_ms,
        app_config.request_timeout(),
    )?;

    Ok(Arc::new(client))
}
