pub mod dca_run;

pub use dca_run::{is_same_week, DcaService, RunOutcome};
