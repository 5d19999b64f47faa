//! Hardware abstraction contracts.
//!
//! This module contains the pin driver traits the framework consumes.
//! Concrete drivers live in `modus_hal`.

pub mod driver;

pub use driver::{HalError, PinDriver, PinMode, PinProvider};
