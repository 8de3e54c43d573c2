pub mod binance;
pub mod postgres;

pub use binance::{
    BinanceClient, DEFAULT_BINANCE_API_BASE, DEFAULT_RECV_WINDOW_MS, TESTNET_BINANCE_API_BASE,
};
pub use postgres::PostgresStore;
