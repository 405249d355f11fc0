//! Execution context and the composition patterns

pub mod context;
pub mod fan_out_fan_in;
pub(crate) mod invoke;
pub mod parallel;
pub mod retry;

pub use context::ExecContext;
pub use fan_out_fan_in::FanOutFanIn;
pub use parallel::Parallel;
pub use retry::{Backoff, InvokeWithRetry};

/// A composition pattern selectable by its stable name
pub trait Pattern {
    fn name(&self) -> &'static str;
}
