//! Modus Common Library
//!
//! This crate provides the contracts shared by every modus crate: the
//! module lifecycle trait, resource keys, events, the cancellation token,
//! configuration loading and the collaborator traits the core consumes.
//!
//! # Module Structure
//!
//! - [`module`] - `Module` lifecycle trait, module state and errors
//! - [`resource`] - Resource classes, keys and lock errors
//! - [`event`] - Event value passed over the bus
//! - [`cancel`] - One-shot cancellation token
//! - [`config`] - Configuration loading traits and types
//! - [`store`] - Persistent configuration store contract
//! - [`hal`] - Pin driver contract
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use modus_common::prelude::*;
//! ```

pub mod cancel;
pub mod config;
pub mod consts;
pub mod event;
pub mod hal;
pub mod module;
pub mod prelude;
pub mod resource;
pub mod store;
