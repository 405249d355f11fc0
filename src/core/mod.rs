// Infrastructure shared by the action model and the execution patterns

pub mod config;
pub mod errors;
pub mod registry;

// Re-export commonly used types
pub use self::config::{ExecConfig, ExecConfigBuilder};
pub use self::errors::{FlowError, Result};
pub use self::registry::{Registry, RegistryBuilder};
