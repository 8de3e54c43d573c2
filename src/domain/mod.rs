pub mod filters;
pub mod order;

pub use filters::*;
pub use order::*;
