//! Pin driver implementations.
//!
//! - [`simulation`] - In-memory pin bank for development and testing
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement `PinProvider` and `PinDriver` from `modus_common::hal`
//! 3. Expose a `create_provider()` factory like the simulation driver

pub mod simulation;
