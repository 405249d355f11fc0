use thiserror::Error;

/// Engine-level error type for actionflow.
///
/// Failures of individual actions never surface here: they become error
/// entries of the returned `ActionResults`. A `FlowError` only reports a
/// violated precondition or a misconfigured engine, before any work started.
#[derive(Debug, Error)]
pub enum FlowError {
    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        field: Option<String>,
    },

    /// Two actions of one pattern invocation share a name
    #[error("Duplicate action name: {name}")]
    DuplicateActionName { name: String },

    /// No tokio runtime to run actions on
    #[error("No async runtime available: {message}")]
    NoRuntime { message: String },

    /// A dependency requested from the registry is not registered
    #[error("Missing dependency in registry: {type_name}")]
    MissingDependency { type_name: String },

    /// Serialization errors
    #[error("Serialization failed: {format}")]
    Serialization {
        format: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl FlowError {
    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
            field: None,
        }
    }

    /// Create a configuration error pointing at a config field
    pub fn configuration_field<S: Into<String>, F: Into<String>>(message: S, field: F) -> Self {
        Self::Configuration {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a duplicate action name error
    pub fn duplicate_action<S: Into<String>>(name: S) -> Self {
        Self::DuplicateActionName { name: name.into() }
    }

    /// Create a missing runtime error
    pub fn no_runtime<S: Into<String>>(message: S) -> Self {
        Self::NoRuntime {
            message: message.into(),
        }
    }

    /// Create a missing dependency error
    pub fn missing_dependency<S: Into<String>>(type_name: S) -> Self {
        Self::MissingDependency {
            type_name: type_name.into(),
        }
    }

    /// Create a serialization error
    pub fn serialization<S: Into<String>, E: std::error::Error + Send + Sync + 'static>(
        format: S,
        source: E,
    ) -> Self {
        Self::Serialization {
            format: format.into(),
            source: Box::new(source),
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::DuplicateActionName { .. } => "precondition",
            Self::NoRuntime { .. } => "runtime",
            Self::MissingDependency { .. } => "registry",
            Self::Serialization { .. } => "serialization",
        }
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, FlowError>;

impl From<serde_json::Error> for FlowError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization("json", err)
    }
}

impl From<serde_yaml::Error> for FlowError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::serialization("yaml", err)
    }
}
