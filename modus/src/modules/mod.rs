//! Modules of the button/LED image.
//!
//! - [`button`] - Click detection on a pull-up input
//! - [`led`] - Animated status LED with persisted mode

pub mod button;
pub mod led;

pub use button::ButtonModule;
pub use led::LedModule;

use modus_common::consts::GPIO_SERVICE;
use modus_common::hal::PinProvider;
use modus_common::module::ModuleError;
use modus_core::Context;
use std::sync::Arc;

/// Topic carrying click commands from the button to the LED.
pub const COMMAND_TOPIC: &str = "input/command";

/// Resolve the pin provider published by the image.
fn pin_provider(ctx: &Context) -> Result<Arc<dyn PinProvider>, ModuleError> {
    ctx.services
        .get::<Arc<dyn PinProvider>>(GPIO_SERVICE)
        .map(|provider| Arc::clone(&*provider))
        .map_err(|e| ModuleError::other(e.to_string()))
}
