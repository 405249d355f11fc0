// Shared infrastructure: configuration, errors, registry
pub mod core;

// Action model and outcomes
pub mod action;

// Execution context and composition patterns
pub mod exec;

// Re-exports for convenience
pub use crate::core::config::{ExecConfig, ExecConfigBuilder};
pub use crate::core::errors::{FlowError, Result};
pub use crate::core::registry::{Registry, RegistryBuilder};

pub use action::{
    Action, ActionFuture, ActionHandler, ActionResult, ActionResults, Fault, FaultKind,
    SUCCESS_CODE,
};
pub use exec::{Backoff, ExecContext, FanOutFanIn, InvokeWithRetry, Parallel, Pattern};
