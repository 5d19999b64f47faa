//! Lock-guarded GPIO pin.
//!
//! [`GpioPin::claim`] is the only way to get a pin: it locks `(GPIO, id)`
//! for the owner first and configures the driver second. Whatever fails
//! after the lock was taken gives the lock back.

use modus_common::hal::{HalError, PinDriver, PinMode, PinProvider};
use modus_common::module::ModuleError;
use modus_common::resource::{ResourceClass, ResourceError, ResourceId};
use modus_core::ResourceManager;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors returned while claiming a pin.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GpioError {
    /// Pin already owned by another module.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Driver refused the pin or the mode.
    #[error(transparent)]
    Hal(#[from] HalError),
}

impl From<GpioError> for ModuleError {
    fn from(err: GpioError) -> Self {
        match err {
            GpioError::Resource(e) => ModuleError::Resource(e),
            GpioError::Hal(e) => ModuleError::Hal(e),
        }
    }
}

/// A configured pin owned by one module.
pub struct GpioPin {
    id: ResourceId,
    mode: PinMode,
    owner: String,
    driver: Option<Box<dyn PinDriver>>,
    resources: Arc<ResourceManager>,
}

impl std::fmt::Debug for GpioPin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GpioPin")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("owner", &self.owner)
            .field("open", &self.driver.is_some())
            .finish()
    }
}

impl GpioPin {
    /// Lock pin `id` for `owner`, then configure it as `mode`.
    ///
    /// # Errors
    /// - `GpioError::Resource` if the pin is already locked
    /// - `GpioError::Hal` if the provider or driver rejects the pin; the
    ///   lock is released
    pub fn claim(
        resources: &Arc<ResourceManager>,
        provider: &dyn PinProvider,
        id: ResourceId,
        mode: PinMode,
        owner: &str,
    ) -> Result<Self, GpioError> {
        resources.lock(ResourceClass::Gpio, id, owner)?;

        let driver = provider.pin(id).and_then(|mut driver| {
            driver.configure(mode)?;
            Ok(driver)
        });
        let driver = match driver {
            Ok(driver) => driver,
            Err(e) => {
                warn!("GPIO {id}: configure as {mode:?} failed for '{owner}': {e}");
                if let Err(unlock) = resources.unlock(ResourceClass::Gpio, id, owner) {
                    warn!("GPIO {id}: release after failed claim: {unlock}");
                }
                return Err(e.into());
            }
        };

        debug!("GPIO {id}: claimed by '{owner}' as {mode:?}");
        Ok(Self {
            id,
            mode,
            owner: owner.to_string(),
            driver: Some(driver),
            resources: Arc::clone(resources),
        })
    }

    /// Pin number.
    pub fn id(&self) -> ResourceId {
        self.id
    }

    /// Configured mode.
    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// Owning module.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Drive the output level.
    pub fn set(&mut self, high: bool) {
        if let Some(driver) = self.driver.as_mut() {
            driver.set(high);
        }
    }

    /// Drive high.
    pub fn high(&mut self) {
        self.set(true);
    }

    /// Drive low.
    pub fn low(&mut self) {
        self.set(false);
    }

    /// Read the level.
    pub fn get(&self) -> bool {
        self.driver.as_ref().is_some_and(|d| d.get())
    }

    /// Invert the output. Returns the new level.
    pub fn toggle(&mut self) -> bool {
        let level = !self.get();
        self.set(level);
        level
    }

    /// Release the driver, then the lock.
    pub fn close(mut self) -> Result<(), ResourceError> {
        self.release()
    }

    fn release(&mut self) -> Result<(), ResourceError> {
        if self.driver.take().is_none() {
            return Ok(());
        }
        self.resources
            .unlock(ResourceClass::Gpio, self.id, &self.owner)?;
        debug!("GPIO {}: released by '{}'", self.id, self.owner);
        Ok(())
    }
}

impl Drop for GpioPin {
    fn drop(&mut self) {
        if self.driver.is_some() {
            warn!("GPIO {}: dropped without close, releasing", self.id);
            if let Err(e) = self.release() {
                warn!("GPIO {}: release on drop failed: {e}", self.id);
            }
        }
    }
}

static_assertions::assert_impl_all!(GpioPin: Send);
