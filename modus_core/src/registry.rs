//! Module registry.
//!
//! Holds every registered module in registration order. Boot and shutdown
//! both walk the registry in that order.

use modus_common::module::{Module, ModuleState};
use parking_lot::Mutex;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Registry errors. Both are fatal at boot.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A module with this name is already registered.
    #[error("module '{name}' already registered")]
    DuplicateRegistration {
        /// Offending name.
        name: String,
    },

    /// Module name is empty.
    #[error("module name must not be empty")]
    InvalidName,
}

/// Module shared between the engine and its supervisor task.
pub(crate) type SharedModule = Arc<tokio::sync::Mutex<Box<dyn Module>>>;

/// One registered module.
pub(crate) struct ModuleEntry {
    pub(crate) name: String,
    pub(crate) module: SharedModule,
    pub(crate) state: Arc<Mutex<ModuleState>>,
}

impl ModuleEntry {
    pub(crate) fn set_state(&self, state: ModuleState) {
        *self.state.lock() = state;
    }
}

/// Ordered set of uniquely named modules.
#[derive(Default)]
pub struct ModuleRegistry {
    entries: Vec<ModuleEntry>,
}

impl std::fmt::Debug for ModuleRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModuleRegistry")
            .field("modules", &self.names())
            .finish()
    }
}

impl ModuleRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a module.
    ///
    /// # Errors
    /// - `RegistryError::InvalidName` if the module name is empty
    /// - `RegistryError::DuplicateRegistration` if the name is taken; the
    ///   first registration stays
    pub fn register<M: Module>(&mut self, module: M) -> Result<(), RegistryError> {
        self.register_boxed(Box::new(module))
    }

    /// Add an already boxed module.
    pub fn register_boxed(&mut self, module: Box<dyn Module>) -> Result<(), RegistryError> {
        let name = module.name().to_string();
        if name.is_empty() {
            return Err(RegistryError::InvalidName);
        }
        if self.contains(&name) {
            return Err(RegistryError::DuplicateRegistration { name });
        }

        debug!("Module registered: '{name}'");
        self.entries.push(ModuleEntry {
            name,
            module: Arc::new(tokio::sync::Mutex::new(module)),
            state: Arc::new(Mutex::new(ModuleState::Registered)),
        });
        Ok(())
    }

    /// Module names with their current state, in registration order.
    pub fn list(&self) -> Vec<(String, ModuleState)> {
        self.entries
            .iter()
            .map(|e| (e.name.clone(), *e.state.lock()))
            .collect()
    }

    /// Module names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.clone()).collect()
    }

    /// Whether a module with `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Lifecycle state of a module.
    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| *e.state.lock())
    }

    /// Number of registered modules.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn entries(&self) -> &[ModuleEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use modus_common::cancel::CancelToken;
    use modus_common::module::ModuleError;
    use modus_common::prelude::async_trait;

    struct Named(&'static str);

    #[async_trait]
    impl Module for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn init(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }
        async fn start(&mut self, _token: CancelToken) {}
        fn stop(&mut self) -> Result<(), ModuleError> {
            Ok(())
        }
    }

    #[test]
    fn keeps_registration_order() {
        let mut registry = ModuleRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry.register(Named(name)).unwrap();
        }
        assert_eq!(registry.names(), vec!["zeta", "alpha", "mid"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.list().iter().all(|(_, s)| *s == ModuleState::Registered));
    }

    #[test]
    fn duplicate_keeps_first() {
        let mut registry = ModuleRegistry::new();
        registry.register(Named("led")).unwrap();
        let err = registry.register(Named("led")).unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateRegistration {
                name: "led".to_string()
            }
        );
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn empty_name_rejected() {
        let mut registry = ModuleRegistry::new();
        assert_eq!(registry.register(Named("")), Err(RegistryError::InvalidName));
        assert!(registry.is_empty());
        assert_eq!(registry.state("ghost"), None);
    }
}
