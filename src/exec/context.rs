//! Explicit execution handle threaded through patterns and actions
//!
//! Nothing in the engine reaches for ambient scheduler state: every pattern
//! call and every action receives an `ExecContext` carrying the runtime handle,
//! the bounded blocking pool, the configuration and the caller's registry.

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

use crate::core::config::ExecConfig;
use crate::core::errors::{FlowError, Result};
use crate::core::registry::Registry;

/// Execution context (cheap to clone)
#[derive(Clone)]
pub struct ExecContext {
    execution_id: Arc<str>,
    handle: Handle,
    config: Arc<ExecConfig>,
    blocking_permits: Arc<Semaphore>,
    registry: Registry,
}

impl ExecContext {
    /// Create a context on the runtime the caller is running in
    pub fn new(config: ExecConfig) -> Result<Self> {
        let handle = Handle::try_current().map_err(|e| FlowError::no_runtime(e.to_string()))?;
        Self::with_handle(handle, config)
    }

    /// Create a context on an explicit runtime handle
    pub fn with_handle(handle: Handle, config: ExecConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            execution_id: Arc::from(uuid::Uuid::new_v4().to_string()),
            blocking_permits: Arc::new(Semaphore::new(config.max_blocking_tasks)),
            config: Arc::new(config),
            handle,
            registry: Registry::empty(),
        })
    }

    /// Same context, forwarding the given registry to actions
    pub fn with_registry(&self, registry: Registry) -> Self {
        Self {
            registry,
            ..self.clone()
        }
    }

    pub fn execution_id(&self) -> &str {
        &self.execution_id
    }

    pub fn config(&self) -> &ExecConfig {
        &self.config
    }

    /// The read-only registry forwarded by the current pattern invocation
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Run blocking or CPU-bound work off the coordinating threads.
    ///
    /// At most `max_blocking_tasks` closures run at once per context. A panic
    /// inside `f` is resumed in the caller, so the engine captures it like any
    /// other panic of the action.
    pub async fn blocking<F, R>(&self, f: F) -> anyhow::Result<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let permit = self
            .blocking_permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| anyhow::anyhow!("blocking pool closed: {}", e))?;

        let task = self.handle.spawn_blocking(move || {
            let _permit = permit;
            f()
        });

        match task.await {
            Ok(value) => Ok(value),
            Err(e) if e.is_panic() => std::panic::resume_unwind(e.into_panic()),
            Err(e) => Err(anyhow::anyhow!("blocking task failed: {}", e)),
        }
    }

    pub(crate) fn spawn<F>(&self, future: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future)
    }
}

impl std::fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecContext")
            .field("execution_id", &self.execution_id)
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish()
    }
}
