//! # Modus Firmware Image
//!
//! Button/LED demo image: a `button` module turns presses on a pull-up
//! input into click commands, and an `led` module animates an output pin
//! according to the last command.
//!
//! # Module Structure
//!
//! - [`app`] - Engine assembly for the image
//! - [`modules`] - The image's modules
//!
//! # Data Flow
//!
//! ```text
//! GPIO 0 ──► button ──(input/command: 1|2|3)──► EventBus ──► led ──► GPIO 13
//!                                                             │
//!                                                             └──► settings store
//! ```

#![warn(missing_docs)]

pub mod app;
pub mod modules;

pub use crate::app::{AppError, build_engine};
