use clap::Parser;
use rust_decimal::Decimal;

use crate::config::{normalize_symbol, AppConfig};
use crate::domain::TimeInForce;

/// Every flag falls back to its environment variable, then to the loaded config.
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "crypto-dca")]
#[command(version)]
#[command(about = "Weekly limit-order DCA buyer for Binance spot", long_about = None)]
pub struct Cli {
    /// Config directory (default.toml, <DCA_ENV>.toml)
    #[arg(short, long, default_value = "config")]
    pub config: String,

    /// Binance REST base URL (https://testnet.binance.vision for testnet)
    #[arg(long, env = "BINANCE_BASE_URL")]
    pub base_url: Option<String>,

    /// Trading pair, e.g. BTCEUR or BTC/EUR
    #[arg(short, long, env = "SYMBOL")]
    pub symbol: Option<String>,

    /// Quote amount to spend
    #[arg(long = "spend-eur", env = "SPEND_EUR")]
    pub spend: Option<Decimal>,

    /// Limit price as a fraction of the best ask
    #[arg(long, env = "PRICE_MULTIPLIER")]
    pub price_multiplier: Option<Decimal>,

    /// GTC, IOC or FOK
    #[arg(long, env = "TIME_IN_FORCE")]
    pub time_in_force: Option<TimeInForce>,

    /// Size the order without placing it
    #[arg(short, long, env = "DRY_RUN", value_parser = clap::builder::BoolishValueParser::new())]
    pub dry_run: bool,

    /// Buy even if this week's order already filled
    #[arg(long)]
    pub force: bool,

    /// Seconds between status checks
    #[arg(long)]
    pub poll_interval: Option<u64>,

    /// Consecutive above-limit checks before repricing
    #[arg(long)]
    pub intervals_before_reprice: Option<u32>,

    /// Reprice attempts before giving up
    #[arg(long)]
    pub max_reprices: Option<u32>,

    /// recvWindow for signed requests (ms)
    #[arg(long, env = "RECV_WINDOW")]
    pub recv_window: Option<u64>,

    /// PostgreSQL URL for order history
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Account the orders are recorded under
    #[arg(long, env = "DCA_ACCOUNT")]
    pub account: Option<String>,

    #[arg(long, env = "LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    pub log_json: bool,
}

impl Cli {
    /// Override loaded config values with whatever was given on the command line
    pub fn apply(&self, cfg: &mut AppConfig) {
        if let Some(url) = &self.base_url {
            cfg.exchange.base_url = url.clone();
        }
        if let Some(window) = self.recv_window {
            cfg.exchange.recv_window_ms = window;
        }
        if let Some(symbol) = &self.symbol {
            cfg.order.symbol = symbol.clone();
        }
        cfg.order.symbol = normalize_symbol(&cfg.order.symbol);
        if let Some(spend) = self.spend {
            cfg.order.spend_quote = Some(spend);
        }
        if let Some(multiplier) = self.price_multiplier {
            cfg.order.price_multiplier = multiplier;
        }
        if let Some(tif) = self.time_in_force {
            cfg.order.time_in_force = tif;
        }
        if let Some(secs) = self.poll_interval {
            cfg.order.poll_interval_secs = secs;
        }
        if let Some(intervals) = self.intervals_before_reprice {
            cfg.order.intervals_before_reprice = intervals;
        }
        if let Some(max) = self.max_reprices {
            cfg.order.max_reprices = max;
        }
        if let Some(url) = &self.database_url {
            cfg.database.url = Some(url.clone());
        }
        if let Some(account) = &self.account {
            cfg.account = account.clone();
        }
        if let Some(level) = &self.log_level {
            cfg.logging.level = level.clone();
        }
        cfg.logging.json |= self.log_json;
        cfg.dry_run |= self.dry_run;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_flags() {
        let cli = Cli::try_parse_from([
            "crypto-dca",
            "--symbol",
            "eth/eur",
            "--spend-eur",
            "25.50",
            "--price-multiplier",
            "0.995",
            "--time-in-force",
            "ioc",
            "--max-reprices",
            "0",
            "--dry-run",
        ])
        .unwrap();

        assert_eq!(cli.spend, Some(dec!(25.50)));
        assert_eq!(cli.time_in_force, Some(TimeInForce::IOC));

        let mut cfg = AppConfig::default_config(None, false);
        cli.apply(&mut cfg);

        assert_eq!(cfg.order.symbol, "ETHEUR");
        assert_eq!(cfg.order.spend_quote, Some(dec!(25.50)));
        assert_eq!(cfg.order.price_multiplier, dec!(0.995));
        assert_eq!(cfg.order.max_reprices, 0);
        assert_eq!(cfg.order.intervals_before_reprice, 5);
        assert!(cfg.dry_run);
    }

    #[test]
    fn test_apply_keeps_config_when_flags_absent() {
        let cli = Cli::default();
        let mut cfg = AppConfig::default_config(Some(dec!(100)), true);
        cfg.database.url = Some("postgres://localhost/dca".to_string());

        cli.apply(&mut cfg);

        assert_eq!(cfg.order.spend_quote, Some(dec!(100)));
        assert_eq!(cfg.database.url.as_deref(), Some("postgres://localhost/dca"));
        assert!(cfg.dry_run);
    }

    #[test]
    fn test_invalid_time_in_force_rejected() {
        assert!(Cli::try_parse_from(["crypto-dca", "--time-in-force", "GTX"]).is_err());
    }
}
