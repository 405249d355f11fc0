//! Outcome records produced by actions and collected by the patterns

use std::collections::hash_map;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::fault::Fault;

/// Code carried by every successful result
pub const SUCCESS_CODE: &str = "0";

/// The immutable outcome of one action.
///
/// Build one through the named constructors. A result is a success only when
/// its code is [`SUCCESS_CODE`] and no fault was captured.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionResult<T> {
    code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<String>,
    #[serde(skip)]
    error: Option<Fault>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

impl<T> ActionResult<T> {
    /// A successful result, with no message
    pub fn success() -> Self {
        Self {
            code: SUCCESS_CODE.to_string(),
            message: None,
            error: None,
            data: None,
        }
    }

    /// A successful result with the given message
    pub fn success_with_message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success()
        }
    }

    /// A successful result carrying data
    pub fn success_with_data(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::success()
        }
    }

    /// A successful result with both a message and data
    pub fn success_with(message: impl Into<String>, data: T) -> Self {
        Self {
            code: SUCCESS_CODE.to_string(),
            message: Some(message.into()),
            error: None,
            data: Some(data),
        }
    }

    /// A declared, business-level error
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: Some(message.into()),
            error: None,
            data: None,
        }
    }

    /// An error built from a captured fault
    pub fn from_fault(fault: Fault) -> Self {
        Self {
            code: fault.to_string(),
            message: Some(fault.message().to_string()),
            error: Some(fault),
            data: None,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// The captured fault, present only when one was raised
    pub fn fault(&self) -> Option<&Fault> {
        self.error.as_ref()
    }

    pub fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    pub fn into_data(self) -> Option<T> {
        self.data
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE && self.error.is_none()
    }

    pub fn is_error(&self) -> bool {
        !self.is_success()
    }
}

impl<T> From<Fault> for ActionResult<T> {
    fn from(fault: Fault) -> Self {
        Self::from_fault(fault)
    }
}

/// Immutable outcomes of one pattern invocation, keyed by action name.
///
/// Serializes as a plain object: `{ "<name>": { "code", "message"?, "data"? } }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionResults<T> {
    results: HashMap<String, ActionResult<T>>,
}

impl<T> ActionResults<T> {
    /// No outcomes at all
    pub fn empty() -> Self {
        Self {
            results: HashMap::new(),
        }
    }

    /// Exactly one outcome
    pub fn single(name: impl Into<String>, result: ActionResult<T>) -> Self {
        let mut results = HashMap::with_capacity(1);
        results.insert(name.into(), result);
        Self { results }
    }

    pub fn get(&self, name: &str) -> Option<&ActionResult<T>> {
        self.results.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.results.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> hash_map::Iter<'_, String, ActionResult<T>> {
        self.results.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.results.keys().map(String::as_str)
    }

    /// Entries whose outcome is a success
    pub fn successes(&self) -> impl Iterator<Item = (&str, &ActionResult<T>)> {
        self.iter()
            .filter(|(_, result)| result.is_success())
            .map(|(name, result)| (name.as_str(), result))
    }

    /// Entries whose outcome is an error
    pub fn errors(&self) -> impl Iterator<Item = (&str, &ActionResult<T>)> {
        self.iter()
            .filter(|(_, result)| result.is_error())
            .map(|(name, result)| (name.as_str(), result))
    }

    /// True when every entry succeeded (vacuously true when empty)
    pub fn is_all_success(&self) -> bool {
        self.results.values().all(ActionResult::is_success)
    }

    pub fn results(&self) -> &HashMap<String, ActionResult<T>> {
        &self.results
    }

    pub fn into_results(self) -> HashMap<String, ActionResult<T>> {
        self.results
    }
}

impl<T: Serialize> ActionResults<T> {
    /// Snapshot for a renderer
    pub fn to_json(&self) -> crate::Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl<T> Default for ActionResults<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T, S: Into<String>> FromIterator<(S, ActionResult<T>)> for ActionResults<T> {
    fn from_iter<I: IntoIterator<Item = (S, ActionResult<T>)>>(iter: I) -> Self {
        Self {
            results: iter
                .into_iter()
                .map(|(name, result)| (name.into(), result))
                .collect(),
        }
    }
}

impl<T> IntoIterator for ActionResults<T> {
    type Item = (String, ActionResult<T>);
    type IntoIter = hash_map::IntoIter<String, ActionResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a ActionResults<T> {
    type Item = (&'a String, &'a ActionResult<T>);
    type IntoIter = hash_map::Iter<'a, String, ActionResult<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
