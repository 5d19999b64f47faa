//! # Modus HAL
//!
//! Pin-level hardware access for modules.
//!
//! A module never talks to a [`PinDriver`](modus_common::hal::PinDriver)
//! directly. It claims a [`GpioPin`], which locks `(GPIO, id)` in the
//! resource manager before the driver is configured and gives the lock back
//! when the pin is closed or dropped.
//!
//! # Module Structure
//!
//! - [`gpio`] - Lock-guarded GPIO pin wrapper
//! - [`drivers`] - Pin driver implementations

#![warn(missing_docs)]

pub mod drivers;
pub mod gpio;

pub use crate::drivers::simulation::SimulatedPinBank;
pub use crate::gpio::{GpioError, GpioPin};
