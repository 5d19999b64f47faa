//! # Modus Core
//!
//! Coordination core for firmware built from independent modules.
//!
//! # Module Structure
//!
//! - [`engine`] - Lifecycle engine, fault boundary and shutdown
//! - [`registry`] - Ordered module registry
//! - [`resource`] - Exclusive resource lock manager
//! - [`bus`] - Topic publish/subscribe with bounded queues
//! - [`services`] - Named, type-checked service sharing
//! - [`settings`] - Typed settings persistence
//! - [`store`] - Memory and file configuration stores
//! - [`context`] - Collaborators shared with modules
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                              Engine                               │
//! │  ┌──────────────┐   init / stop   ┌─────────────────────────────┐ │
//! │  │   Registry   │ ──────────────► │ Module (trait object)       │ │
//! │  │ (reg. order) │                 │  start() in own task        │ │
//! │  └──────────────┘                 │  behind a supervisor        │ │
//! │                                   └──────────────┬──────────────┘ │
//! │  ┌─────────────────────── Context ───────────────▼──────────────┐ │
//! │  │ ResourceManager │ EventBus │ ServiceLocator │ Settings │ Stop│ │
//! │  └──────────────────────────────────────────────────────────────┘ │
//! └───────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod bus;
pub mod context;
pub mod engine;
pub mod registry;
pub mod resource;
pub mod services;
pub mod settings;
pub mod store;

pub use crate::bus::{EventBus, Subscription};
pub use crate::context::{Context, ShutdownHandle};
pub use crate::engine::{Engine, EngineError, EngineState, RunReport, StopFailure};
pub use crate::registry::{ModuleRegistry, RegistryError};
pub use crate::resource::{ResourceLease, ResourceManager};
pub use crate::services::{ServiceError, ServiceLocator};
pub use crate::settings::SettingsManager;
pub use crate::store::{FileStore, MemoryStore};

static_assertions::assert_impl_all!(ResourceManager: Send, Sync);
static_assertions::assert_impl_all!(EventBus: Send, Sync);
static_assertions::assert_impl_all!(ServiceLocator: Send, Sync);
static_assertions::assert_impl_all!(SettingsManager: Send, Sync);
static_assertions::assert_impl_all!(Context: Send, Sync, Clone);
static_assertions::assert_impl_all!(ShutdownHandle: Send, Sync, Clone);
