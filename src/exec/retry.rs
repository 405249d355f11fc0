//! Bounded retry around a single action

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::context::ExecContext;
use super::Pattern;
use crate::action::{Action, ActionResults};
use crate::core::errors::{FlowError, Result};
use crate::core::registry::Registry;

pub const PATTERN_NAME: &str = "invokewithretry";

/// Pacing between retry attempts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Backoff {
    /// No delay between attempts
    Immediate,
    /// The same delay before every retry
    Fixed { delay_ms: u64 },
    /// `delay_ms` times the retry number
    Linear { delay_ms: u64 },
    /// Exponential backoff, capped at `max_delay_ms`, optionally with ±10% jitter
    Exponential {
        initial_delay_ms: u64,
        max_delay_ms: u64,
        multiplier: f64,
        #[serde(default)]
        jitter: bool,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Immediate
    }
}

impl Backoff {
    /// Delay before the given retry (1 for the first retry)
    pub fn delay_for(&self, retry: u32) -> Duration {
        match self {
            Self::Immediate => Duration::ZERO,
            Self::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            Self::Linear { delay_ms } => {
                Duration::from_millis(delay_ms.saturating_mul(u64::from(retry.max(1))))
            }
            Self::Exponential {
                initial_delay_ms,
                max_delay_ms,
                multiplier,
                jitter,
            } => {
                let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
                let mut delay = *initial_delay_ms as f64 * multiplier.max(1.0).powi(exponent);
                if *jitter {
                    let spread = fastrand::f64() * 0.2 - 0.1;
                    delay *= 1.0 + spread;
                }
                let capped = delay.min(*max_delay_ms as f64).max(0.0);
                Duration::from_millis(capped.round() as u64)
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let Self::Exponential {
            initial_delay_ms,
            max_delay_ms,
            multiplier,
            ..
        } = self
        {
            if !multiplier.is_finite() || *multiplier < 1.0 {
                return Err(FlowError::configuration_field(
                    "exponential backoff multiplier must be a finite value >= 1.0",
                    "retry_backoff.multiplier",
                ));
            }
            if initial_delay_ms > max_delay_ms {
                return Err(FlowError::configuration_field(
                    "initial_delay_ms must not exceed max_delay_ms",
                    "retry_backoff.initial_delay_ms",
                ));
            }
        }
        Ok(())
    }
}

/// Invokes one action, retrying failed outcomes up to `max_retries` times.
///
/// An outcome is retried when it is an error: a declared error code and a
/// captured fault are treated alike. The last outcome is reported verbatim,
/// so `max_retries == 0` means exactly one invocation.
#[derive(Debug, Clone, Default)]
pub struct InvokeWithRetry {
    max_retries: u32,
    backoff: Option<Backoff>,
}

impl InvokeWithRetry {
    pub fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: None,
        }
    }

    /// Pace retries with `backoff` instead of the context's configured policy
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn backoff(&self) -> Option<&Backoff> {
        self.backoff.as_ref()
    }

    #[instrument(
        skip_all,
        fields(
            execution_id = %ctx.execution_id(),
            action = %action.name(),
            max_retries = self.max_retries
        )
    )]
    pub async fn apply<T, O>(
        &self,
        ctx: &ExecContext,
        registry: &Registry,
        action: Action<T, O>,
    ) -> ActionResults<O>
    where
        T: Clone + Send + 'static,
        O: Send + 'static,
    {
        let scoped = ctx.with_registry(registry.clone());
        let backoff = self
            .backoff
            .as_ref()
            .unwrap_or(&ctx.config().retry_backoff);

        let mut outcome = action.invoke(&scoped).await;
        let mut attempts: u32 = 1;

        while outcome.is_error() && attempts <= self.max_retries {
            let delay = backoff.delay_for(attempts);
            debug!(
                attempt = attempts + 1,
                delay_ms = delay.as_millis() as u64,
                code = outcome.code(),
                "retrying action"
            );
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            outcome = action.invoke(&scoped).await;
            attempts += 1;
        }

        if outcome.is_error() {
            warn!(attempts, code = outcome.code(), "action failed after retries");
        } else {
            debug!(attempts, "action succeeded");
        }

        ActionResults::single(action.name(), outcome)
    }
}

impl Pattern for InvokeWithRetry {
    fn name(&self) -> &'static str {
        PATTERN_NAME
    }
}
