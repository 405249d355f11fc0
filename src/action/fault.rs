//! Captured failures of a single action invocation

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinError;

/// What went wrong while invoking an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// The action returned an error
    Error,
    /// The action panicked
    Panic,
    /// The invocation exceeded the configured timeout
    Timeout,
    /// The task running the invocation was cancelled
    Cancelled,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Panic => "panic",
            Self::Timeout => "timeout",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fault raised during an invocation and captured by the engine.
///
/// The string form (`"<kind>: <message>"`) becomes the code of the error
/// result built from it.
#[derive(Debug, Clone)]
pub struct Fault {
    kind: FaultKind,
    message: String,
    source: Option<Arc<anyhow::Error>>,
}

impl Fault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Capture an error returned by an action
    pub fn from_error(error: anyhow::Error) -> Self {
        Self {
            kind: FaultKind::Error,
            message: error.to_string(),
            source: Some(Arc::new(error)),
        }
    }

    /// Capture a panic payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::new(FaultKind::Panic, message)
    }

    /// Capture the failure of the task that ran an invocation
    pub fn from_join_error(error: JoinError) -> Self {
        if error.is_panic() {
            Self::from_panic(error.into_panic())
        } else {
            Self::new(FaultKind::Cancelled, error.to_string())
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(
            FaultKind::Timeout,
            format!("action timed out after {}ms", after.as_millis()),
        )
    }

    pub fn kind(&self) -> FaultKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The error an action returned, when the fault came from one
    pub fn source(&self) -> Option<&anyhow::Error> {
        self.source.as_deref()
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl PartialEq for Fault {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.message == other.message
    }
}

impl From<anyhow::Error> for Fault {
    fn from(error: anyhow::Error) -> Self {
        Self::from_error(error)
    }
}
