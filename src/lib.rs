pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod exchange;
pub mod persistence;
pub mod services;
pub mod signing;
pub mod strategy;

pub use config::AppConfig;
pub use error::{DcaError, ExchangeError, Result};
pub use exchange::ExchangeClient;
pub use persistence::{MemoryRepository, OrderRepository};
pub use services::{DcaService, RunOutcome};
pub use strategy::{DcaExecutor, OrderConfig, OrderResult};
