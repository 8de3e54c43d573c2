use config::{Config, ConfigError, Environment, File};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::TimeInForce;
use crate::error::{DcaError, Result};
use crate::strategy::OrderConfig;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub exchange: ExchangeConfig,
    pub order: OrderSettings,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Account the orders are recorded under
    #[serde(default = "default_account")]
    pub account: String,
    /// Size and report the order without placing it
    #[serde(default)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExchangeConfig {
    /// REST API base URL (https://testnet.binance.vision for testnet)
    pub base_url: String,
    /// recvWindow for signed requests in milliseconds
    pub recv_window_ms: u64,
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderSettings {
    /// Trading pair (e.g. BTCEUR)
    pub symbol: String,
    /// Quote amount to spend per run
    #[serde(default)]
    pub spend_quote: Option<Decimal>,
    /// Limit price as a fraction of the best ask (e.g. 0.999)
    pub price_multiplier: Decimal,
    pub time_in_force: TimeInForce,
    /// Seconds between order status checks
    pub poll_interval_secs: u64,
    /// Consecutive above-limit checks before repricing
    pub intervals_before_reprice: u32,
    /// Reprice attempts before giving up
    pub max_reprices: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL; no URL disables order history
    #[serde(default)]
    pub url: Option<String>,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily rotating log files
    #[serde(default)]
    pub dir: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            dir: None,
        }
    }
}

fn default_account() -> String {
    "default".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Highest recvWindow Binance accepts
const MAX_RECV_WINDOW_MS: u64 = 60_000;

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> std::result::Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("exchange.base_url", "https://api.binance.com")?
            .set_default("exchange.recv_window_ms", 5000)?
            .set_default("exchange.request_timeout_secs", 30)?
            .set_default("order.symbol", "BTCEUR")?
            .set_default("order.price_multiplier", "0.999")?
            .set_default("order.time_in_force", "GTC")?
            .set_default("order.poll_interval_secs", 60)?
            .set_default("order.intervals_before_reprice", 5)?
            .set_default("order.max_reprices", 3)?
            .set_default("database.max_connections", 5)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("account", "default")?
            .set_default("dry_run", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("DCA_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (DCA__ORDER__SPEND_QUOTE, etc.)
            .add_source(
                Environment::with_prefix("DCA")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Built-in defaults without touching files or the environment
    pub fn default_config(spend_quote: Option<Decimal>, dry_run: bool) -> Self {
        use rust_decimal_macros::dec;

        Self {
            exchange: ExchangeConfig {
                base_url: "https://api.binance.com".to_string(),
                recv_window_ms: 5000,
                request_timeout_secs: default_request_timeout(),
            },
            order: OrderSettings {
                symbol: "BTCEUR".to_string(),
                spend_quote,
                price_multiplier: dec!(0.999),
                time_in_force: TimeInForce::GTC,
                poll_interval_secs: 60,
                intervals_before_reprice: 5,
                max_reprices: 3,
            },
            database: DatabaseConfig::default(),
            logging: LoggingConfig::default(),
            account: default_account(),
            dry_run,
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.order.symbol.trim().is_empty() {
            errors.push("symbol must not be empty".to_string());
        }

        match self.order.spend_quote {
            None => errors.push("spend amount is required (--spend-eur)".to_string()),
            Some(spend) if spend <= Decimal::ZERO => {
                errors.push(format!("spend amount must be positive, got {spend}"));
            }
            Some(_) => {}
        }

        let multiplier = self.order.price_multiplier;
        if multiplier <= Decimal::ZERO || multiplier >= Decimal::ONE {
            errors.push(format!(
                "price multiplier must be between 0 and 1, got {multiplier}"
            ));
        }

        if self.order.poll_interval_secs == 0 {
            errors.push("poll interval must be at least 1 second".to_string());
        }

        if self.order.intervals_before_reprice == 0 {
            errors.push("intervals before reprice must be at least 1".to_string());
        }

        if self.exchange.recv_window_ms == 0 || self.exchange.recv_window_ms > MAX_RECV_WINDOW_MS {
            errors.push(format!(
                "recv window must be between 1 and {MAX_RECV_WINDOW_MS} ms, got {}",
                self.exchange.recv_window_ms
            ));
        }

        if self.account.trim().is_empty() {
            errors.push("account must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Materialize the immutable per-run order parameters
    pub fn order_config(&self) -> Result<OrderConfig> {
        self.validate()
            .map_err(|errors| DcaError::Configuration(errors.join("; ")))?;

        let spend_quote = self
            .order
            .spend_quote
            .ok_or_else(|| DcaError::Configuration("spend amount is required".into()))?;

        Ok(OrderConfig {
            symbol: self.order.symbol.clone(),
            spend_quote,
            price_multiplier: self.order.price_multiplier,
            time_in_force: self.order.time_in_force,
            poll_interval: Duration::from_secs(self.order.poll_interval_secs),
            intervals_before_reprice: self.order.intervals_before_reprice,
            max_reprices: self.order.max_reprices,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.exchange.request_timeout_secs)
    }
}

/// `BTC/EUR`, `btc-eur`, `BTC_EUR` -> `BTCEUR`
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .trim()
        .chars()
        .filter(|c| !matches!(c, '-' | '/' | '_'))
        .collect::<String>()
        .to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("BTC/EUR"), "BTCEUR");
        assert_eq!(normalize_symbol("btc-eur"), "BTCEUR");
        assert_eq!(normalize_symbol(" eth_usdt "), "ETHUSDT");
        assert_eq!(normalize_symbol("BTCEUR"), "BTCEUR");
    }

    #[test]
    fn test_default_config_requires_spend() {
        let cfg = AppConfig::default_config(None, true);
        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("spend amount is required"));

        let err = cfg.order_config().unwrap_err();
        assert!(matches!(err, DcaError::Configuration(_)));
    }

    #[test]
    fn test_order_config_from_defaults() {
        let cfg = AppConfig::default_config(Some(dec!(100)), false);
        let order = cfg.order_config().unwrap();

        assert_eq!(order.symbol, "BTCEUR");
        assert_eq!(order.spend_quote, dec!(100));
        assert_eq!(order.price_multiplier, dec!(0.999));
        assert_eq!(order.poll_interval, Duration::from_secs(60));
        assert_eq!(order.intervals_before_reprice, 5);
        assert_eq!(order.max_reprices, 3);
    }

    #[test]
    fn test_validate_collects_errors() {
        let mut cfg = AppConfig::default_config(Some(dec!(0)), false);
        cfg.order.price_multiplier = dec!(1.2);
        cfg.order.poll_interval_secs = 0;
        cfg.exchange.recv_window_ms = 70_000;

        let errors = cfg.validate().unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_load_from_missing_dir_uses_defaults() {
        let cfg = AppConfig::load_from("/nonexistent-config-dir").unwrap();
        assert_eq!(cfg.exchange.base_url, "https://api.binance.com");
        assert_eq!(cfg.order.symbol, "BTCEUR");
        assert_eq!(cfg.order.price_multiplier, dec!(0.999));
        assert_eq!(cfg.order.time_in_force, TimeInForce::GTC);
        assert_eq!(cfg.database.max_connections, 5);
        assert!(!cfg.dry_run);
    }
}
