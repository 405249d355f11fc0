//! Read-only lookup context for shared collaborators
//!
//! A `Registry` is built once by the caller and handed to a pattern, which
//! forwards it to every action through the `ExecContext`. Nothing in the
//! engine mutates it after `build()`.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::core::errors::{FlowError, Result};

type Entry = Arc<dyn Any + Send + Sync>;

/// Registry of shared dependencies (clients, configuration, ...)
#[derive(Clone, Default)]
pub struct Registry {
    typed: Arc<HashMap<TypeId, Entry>>,
    named: Arc<HashMap<String, Entry>>,
}

impl Registry {
    /// Create an empty registry
    pub fn empty() -> Self {
        Self::default()
    }

    /// Start building a registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Get a dependency by type
    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.typed
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    /// Get a dependency by type, failing when it is not registered
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>> {
        self.get::<T>()
            .ok_or_else(|| FlowError::missing_dependency(type_name::<T>()))
    }

    /// Get a dependency registered under a name
    pub fn get_named<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        self.named
            .get(name)
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    /// Check if a dependency of this type is registered
    pub fn contains<T: Any + Send + Sync>(&self) -> bool {
        self.typed.contains_key(&TypeId::of::<T>())
    }

    /// List all registered names
    pub fn names(&self) -> Vec<String> {
        self.named.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.typed.len() + self.named.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("typed", &self.typed.len())
            .field("named", &self.names())
            .finish()
    }
}

/// Builder for a `Registry`
#[derive(Default)]
pub struct RegistryBuilder {
    typed: HashMap<TypeId, Entry>,
    named: HashMap<String, Entry>,
}

impl RegistryBuilder {
    /// Register a dependency by its type, replacing any previous one
    pub fn add<T: Any + Send + Sync>(self, value: T) -> Self {
        self.add_arc(Arc::new(value))
    }

    /// Register an already shared dependency by its type
    pub fn add_arc<T: Any + Send + Sync>(mut self, value: Arc<T>) -> Self {
        self.typed.insert(TypeId::of::<T>(), value);
        self
    }

    /// Register a dependency under a name
    pub fn add_named<T: Any + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.named.insert(name.into(), Arc::new(value));
        self
    }

    pub fn build(self) -> Registry {
        Registry {
            typed: Arc::new(self.typed),
            named: Arc::new(self.named),
        }
    }
}
