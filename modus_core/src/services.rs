//! Service locator - named, type-checked sharing of services between modules.
//!
//! Values are stored type-erased together with their type name. Retrieval
//! names the expected type and fails with [`ServiceError::TypeMismatch`]
//! instead of handing back the wrong thing.
//!
//! Trait-object services are registered as `Arc<dyn Trait>` and retrieved
//! with that same type parameter.

use parking_lot::Mutex;
use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Service locator errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// No service under that name.
    #[error("service '{name}' not found")]
    NotFound {
        /// Requested name.
        name: String,
    },

    /// Name already taken.
    #[error("service '{name}' already exists")]
    AlreadyRegistered {
        /// Requested name.
        name: String,
    },

    /// Stored service has a different type.
    #[error("service '{name}' is a {actual}, not a {expected}")]
    TypeMismatch {
        /// Requested name.
        name: String,
        /// Type asked for.
        expected: &'static str,
        /// Type stored.
        actual: &'static str,
    },
}

struct ServiceEntry {
    value: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Registry of shared services.
#[derive(Default)]
pub struct ServiceLocator {
    services: Mutex<HashMap<String, ServiceEntry>>,
}

impl std::fmt::Debug for ServiceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let services = self.services.lock();
        let mut names: Vec<&String> = services.keys().collect();
        names.sort();
        f.debug_struct("ServiceLocator")
            .field("services", &names)
            .finish()
    }
}

impl ServiceLocator {
    /// Create an empty locator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Share `service` under `name`.
    ///
    /// # Errors
    /// `ServiceError::AlreadyRegistered` if the name is taken.
    pub fn register<T>(&self, name: &str, service: T) -> Result<(), ServiceError>
    where
        T: Any + Send + Sync,
    {
        let mut services = self.services.lock();
        if services.contains_key(name) {
            return Err(ServiceError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        services.insert(
            name.to_string(),
            ServiceEntry {
                value: Arc::new(service),
                type_name: type_name::<T>(),
            },
        );
        drop(services);
        debug!("Service registered: '{name}'");
        Ok(())
    }

    /// Remove a service. Absent names are ignored.
    pub fn unregister(&self, name: &str) {
        if self.services.lock().remove(name).is_some() {
            debug!("Service unregistered: '{name}'");
        }
    }

    /// Retrieve the service under `name` as `T`.
    ///
    /// # Errors
    /// - `ServiceError::NotFound` if nothing is registered under `name`
    /// - `ServiceError::TypeMismatch` if the stored value is not a `T`
    pub fn get<T>(&self, name: &str) -> Result<Arc<T>, ServiceError>
    where
        T: Any + Send + Sync,
    {
        let (value, actual) = {
            let services = self.services.lock();
            let entry = services.get(name).ok_or_else(|| ServiceError::NotFound {
                name: name.to_string(),
            })?;
            (Arc::clone(&entry.value), entry.type_name)
        };

        value
            .downcast::<T>()
            .map_err(|_| ServiceError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
                actual,
            })
    }

    /// Whether a service is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.services.lock().contains_key(name)
    }
}
