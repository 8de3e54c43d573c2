pub mod factory;
mod traits;

pub use factory::build_exchange_client;
pub use traits::{ExchangeClient, LimitOrderRequest, OrderId, PlacedOrder};
