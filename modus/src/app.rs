//! Engine assembly.
//!
//! Wires the collaborators and modules of the image. Module constructors
//! receive the engine's context, so the pin provider is published before
//! any module is registered.

use crate::modules::{ButtonModule, LedModule};
use modus_common::config::ModusConfig;
use modus_common::consts::GPIO_SERVICE;
use modus_common::hal::PinProvider;
use modus_common::store::ConfigStore;
use modus_core::{Engine, RegistryError, ServiceError};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Assembly failures. All of them are fatal at boot.
#[derive(Debug, Error)]
pub enum AppError {
    /// Module registration failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Service publication failed.
    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Build the engine of the image.
///
/// `settings` enables persistence of the LED mode; `provider` is published
/// as the `gpio` service.
pub fn build_engine(
    config: &ModusConfig,
    settings: Option<Arc<dyn ConfigStore>>,
    provider: Arc<dyn PinProvider>,
) -> Result<Engine, AppError> {
    let mut engine = Engine::new(config);
    if let Some(store) = settings {
        engine = engine.with_settings_store(store);
    }

    let ctx = engine.context().clone();
    ctx.services.register(GPIO_SERVICE, provider)?;

    engine.register(ButtonModule::new(ctx.clone()))?;
    engine.register(LedModule::new(ctx))?;

    info!(
        "Image '{}' assembled: {:?}",
        config.shared.service_name,
        engine.registry().names()
    );
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use modus_core::MemoryStore;
    use modus_hal::SimulatedPinBank;

    #[test]
    fn registers_both_modules_in_order() {
        let engine = build_engine(
            &ModusConfig::default(),
            None,
            Arc::new(SimulatedPinBank::new(16)),
        )
        .unwrap();
        assert_eq!(engine.registry().names(), vec!["button", "led"]);
        assert!(engine.context().services.contains(GPIO_SERVICE));
        assert!(engine.context().settings.is_none());
    }

    #[test]
    fn settings_store_is_attached() {
        let engine = build_engine(
            &ModusConfig::default(),
            Some(Arc::new(MemoryStore::new())),
            Arc::new(SimulatedPinBank::new(16)),
        )
        .unwrap();
        assert!(engine.context().settings.is_some());
    }
}
