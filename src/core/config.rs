use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;

use crate::core::errors::{FlowError, Result};
use crate::exec::retry::Backoff;

/// Engine configuration shared by every pattern run through one `ExecContext`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecConfig {
    /// Maximum number of blocking action bodies running at once
    pub max_blocking_tasks: usize,
    /// Maximum number of actions of one fan-out in flight at once (None = all)
    pub max_concurrent_actions: Option<usize>,
    /// Upper bound for a single action invocation, in milliseconds
    pub action_timeout_ms: Option<u64>,
    /// Fail a pattern invocation up front when two actions share a name
    pub reject_duplicate_names: bool,
    /// Pacing between retry attempts when a retry pattern sets none itself
    pub retry_backoff: Backoff,
}

impl Default for ExecConfig {
    fn default() -> Self {
        let cpu_count = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);

        Self {
            max_blocking_tasks: cpu_count * 4,
            max_concurrent_actions: None,
            action_timeout_ms: None,
            reject_duplicate_names: false,
            retry_backoff: Backoff::Immediate,
        }
    }
}

impl ExecConfig {
    /// Create a new builder for ExecConfig
    pub fn builder() -> ExecConfigBuilder {
        ExecConfigBuilder::new()
    }

    /// Defaults, but duplicate action names are rejected
    pub fn strict() -> Self {
        Self {
            reject_duplicate_names: true,
            ..Self::default()
        }
    }

    /// Timeout applied to each invocation, if any
    pub fn action_timeout(&self) -> Option<Duration> {
        self.action_timeout_ms.map(Duration::from_millis)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_blocking_tasks == 0 {
            return Err(FlowError::configuration_field(
                "max_blocking_tasks must be greater than 0",
                "max_blocking_tasks",
            ));
        }
        if self.max_blocking_tasks > Semaphore::MAX_PERMITS {
            return Err(FlowError::configuration_field(
                format!(
                    "max_blocking_tasks must not exceed {}",
                    Semaphore::MAX_PERMITS
                ),
                "max_blocking_tasks",
            ));
        }
        match self.max_concurrent_actions {
            Some(0) => {
                return Err(FlowError::configuration_field(
                    "max_concurrent_actions must be greater than 0 when set",
                    "max_concurrent_actions",
                ));
            }
            Some(max) if max > Semaphore::MAX_PERMITS => {
                return Err(FlowError::configuration_field(
                    format!(
                        "max_concurrent_actions must not exceed {}",
                        Semaphore::MAX_PERMITS
                    ),
                    "max_concurrent_actions",
                ));
            }
            _ => {}
        }
        if self.action_timeout_ms == Some(0) {
            return Err(FlowError::configuration_field(
                "action_timeout_ms must be greater than 0 when set",
                "action_timeout_ms",
            ));
        }
        self.retry_backoff.validate()
    }

    /// Load and validate a configuration from YAML
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration from JSON
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}

/// Builder for ExecConfig
#[derive(Debug, Default)]
pub struct ExecConfigBuilder {
    config: ExecConfig,
}

impl ExecConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max_blocking_tasks(mut self, max: usize) -> Self {
        self.config.max_blocking_tasks = max;
        self
    }

    pub fn max_concurrent_actions(mut self, max: usize) -> Self {
        self.config.max_concurrent_actions = Some(max);
        self
    }

    /// Timeout per invocation, rounded up to whole milliseconds
    pub fn action_timeout(mut self, timeout: Duration) -> Self {
        let millis = timeout.as_nanos().div_ceil(1_000_000);
        self.config.action_timeout_ms = Some(u64::try_from(millis).unwrap_or(u64::MAX));
        self
    }

    pub fn reject_duplicate_names(mut self, reject: bool) -> Self {
        self.config.reject_duplicate_names = reject;
        self
    }

    pub fn retry_backoff(mut self, backoff: Backoff) -> Self {
        self.config.retry_backoff = backoff;
        self
    }

    /// Build and validate
    pub fn build(self) -> Result<ExecConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ExecConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.max_blocking_tasks > 0);
        assert!(!config.reject_duplicate_names);
        assert_eq!(config.retry_backoff, Backoff::Immediate);
        assert_eq!(config.action_timeout(), None);
    }

    #[test]
    fn builder_rejects_zero_limits() {
        let err = ExecConfig::builder()
            .max_blocking_tasks(0)
            .build()
            .unwrap_err();
        assert_eq!(err.category(), "configuration");

        let err = ExecConfig::builder()
            .max_concurrent_actions(0)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_concurrent_actions"));

        assert!(ExecConfig::builder()
            .action_timeout(Duration::from_millis(0))
            .build()
            .is_err());
    }

    #[test]
    fn rejects_limits_above_semaphore_capacity() {
        let err = ExecConfig::builder()
            .max_blocking_tasks(usize::MAX)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_blocking_tasks"));

        let err = ExecConfig::builder()
            .max_concurrent_actions(usize::MAX)
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("max_concurrent_actions"));

        assert!(ExecConfig::builder()
            .max_blocking_tasks(Semaphore::MAX_PERMITS)
            .build()
            .is_ok());
    }

    #[test]
    fn sub_millisecond_timeout_rounds_up() {
        let config = ExecConfig::builder()
            .action_timeout(Duration::from_micros(300))
            .build()
            .unwrap();
        assert_eq!(config.action_timeout(), Some(Duration::from_millis(1)));

        let config = ExecConfig::builder()
            .action_timeout(Duration::from_micros(1_500))
            .build()
            .unwrap();
        assert_eq!(config.action_timeout_ms, Some(2));
    }

    #[test]
    fn builder_sets_fields() {
        let config = ExecConfig::builder()
            .max_blocking_tasks(2)
            .max_concurrent_actions(3)
            .action_timeout(Duration::from_millis(250))
            .reject_duplicate_names(true)
            .retry_backoff(Backoff::Fixed { delay_ms: 5 })
            .build()
            .unwrap();

        assert_eq!(config.max_blocking_tasks, 2);
        assert_eq!(config.max_concurrent_actions, Some(3));
        assert_eq!(config.action_timeout(), Some(Duration::from_millis(250)));
        assert!(config.reject_duplicate_names);
        assert_eq!(config.retry_backoff, Backoff::Fixed { delay_ms: 5 });
    }

    #[test]
    fn loads_partial_yaml() {
        let yaml = r#"
max_blocking_tasks: 8
reject_duplicate_names: true
retry_backoff:
  strategy: exponential
  initial_delay_ms: 10
  max_delay_ms: 100
  multiplier: 2.0
  jitter: false
"#;
        let config = ExecConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.max_blocking_tasks, 8);
        assert!(config.reject_duplicate_names);
        assert_eq!(config.max_concurrent_actions, None);
        assert_eq!(
            config.retry_backoff,
            Backoff::Exponential {
                initial_delay_ms: 10,
                max_delay_ms: 100,
                multiplier: 2.0,
                jitter: false,
            }
        );
    }

    #[test]
    fn loads_json_and_validates() {
        let json = r#"{"action_timeout_ms": 500, "retry_backoff": {"strategy": "immediate"}}"#;
        let config = ExecConfig::from_json_str(json).unwrap();
        assert_eq!(config.action_timeout(), Some(Duration::from_millis(500)));

        let err = ExecConfig::from_json_str(r#"{"max_blocking_tasks": 0}"#).unwrap_err();
        assert_eq!(err.category(), "configuration");

        let err = ExecConfig::from_json_str("not json").unwrap_err();
        assert_eq!(err.category(), "serialization");
    }
}
