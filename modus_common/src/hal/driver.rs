//! Pin driver traits and error types.
//!
//! This module defines:
//! - `PinDriver` trait - Thin pass-through to one hardware pin
//! - `PinProvider` trait - Source of pin drivers (a GPIO port)
//! - `PinMode` enum - Electrical configuration of a pin
//! - `HalError` enum - Error types for driver operations
//!
//! A driver is acquired only after the matching `(GPIO, id)` resource has
//! been locked, and released before that lock is dropped.

use crate::resource::ResourceId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for driver operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HalError {
    /// Pin number outside the port.
    #[error("Invalid pin: {0}")]
    InvalidPin(ResourceId),

    /// Mode not supported by this pin.
    #[error("Unsupported mode {mode:?} for pin {pin}")]
    UnsupportedMode {
        /// Target pin.
        pin: ResourceId,
        /// Requested mode.
        mode: PinMode,
    },
}

/// Electrical configuration of a pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PinMode {
    /// Floating input.
    Input,
    /// Input with pull-up resistor (idle high).
    InputPullup,
    /// Input with pull-down resistor (idle low).
    InputPulldown,
    /// Push-pull output.
    Output,
}

impl PinMode {
    /// Whether the pin drives its level.
    pub const fn is_output(self) -> bool {
        matches!(self, PinMode::Output)
    }
}

/// One hardware pin.
pub trait PinDriver: Send {
    /// Pin number within its port.
    fn id(&self) -> ResourceId;

    /// Apply an electrical configuration.
    fn configure(&mut self, mode: PinMode) -> Result<(), HalError>;

    /// Drive the output level. Ignored on inputs.
    fn set(&mut self, high: bool);

    /// Read the current level.
    fn get(&self) -> bool;
}

/// Source of pin drivers.
pub trait PinProvider: Send + Sync {
    /// Driver for pin `id`.
    ///
    /// # Errors
    /// `HalError::InvalidPin` if the port has no such pin.
    fn pin(&self, id: ResourceId) -> Result<Box<dyn PinDriver>, HalError>;
}
