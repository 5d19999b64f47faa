//! Simulation driver.
//!
//! Software pin bank for running firmware images without hardware. Tests
//! and the demo image drive inputs through [`SimulatedPinBank::set_input`]
//! and observe outputs through [`SimulatedPinBank::level`].

mod bank;

pub use bank::{SimulatedPin, SimulatedPinBank};

use modus_common::hal::PinProvider;
use std::sync::Arc;

/// Number of pins in the default bank.
pub const DEFAULT_PIN_COUNT: u16 = 32;

/// Factory for a shared simulated bank with [`DEFAULT_PIN_COUNT`] pins.
pub fn create_provider() -> Arc<dyn PinProvider> {
    Arc::new(SimulatedPinBank::new(DEFAULT_PIN_COUNT))
}
