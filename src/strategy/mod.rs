//! DCA order core: quantization, filter validation, sizing, and the
//! place/monitor/reprice executor.

pub mod events;
pub mod executor;
pub mod monitor;
pub mod rounding;
pub mod sizing;
pub mod types;
pub mod validation;

pub use events::{ExecutionEvent, ExecutionObserver, NoopObserver, TracingObserver};
pub use executor::DcaExecutor;
pub use monitor::{MonitorAction, MonitorState, RepriceMonitor};
pub use rounding::{round_down, round_to_tick};
pub use sizing::{compute_limit_price, compute_quantity, size_order, SizedOrder};
pub use types::{ExecutionOutcome, OrderConfig, OrderResult};
pub use validation::{validate_order, FilterViolation};
