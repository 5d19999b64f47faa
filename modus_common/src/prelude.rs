//! Prelude module for common re-exports.
//!
//! `use modus_common::prelude::*;` brings in everything a module
//! implementation usually needs.

// ─── Lifecycle ──────────────────────────────────────────────────────
pub use crate::cancel::CancelToken;
pub use crate::module::{Module, ModuleError, ModuleState};

// ─── Resources ──────────────────────────────────────────────────────
pub use crate::resource::{ResourceClass, ResourceError, ResourceId, ResourceKey};

// ─── Events ─────────────────────────────────────────────────────────
pub use crate::event::{Event, Payload};

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, ModusConfig, SharedConfig};
pub use crate::store::{ConfigStore, StoreError};

// ─── Hardware ───────────────────────────────────────────────────────
pub use crate::hal::{HalError, PinDriver, PinMode, PinProvider};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::DEFAULT_QUEUE_CAPACITY;

pub use async_trait::async_trait;
