//! Module lifecycle contract.
//!
//! Every hardware-driving component implements [`Module`]. The engine
//! drives the lifecycle:
//!
//! 1. `init()` - called once, sequentially, in registration order
//! 2. `start()` - launched concurrently, one task per module
//! 3. `stop()` - called once, sequentially, after every `start()` returned
//!
//! # Timing Contracts
//!
//! | Operation | Context | Constraint |
//! |-----------|---------|------------|
//! | `init()` | boot, sequential | failure aborts boot |
//! | `start()` | own task | must yield; return promptly on cancel |
//! | `stop()` | shutdown, sequential | no timeout is imposed |

use crate::cancel::CancelToken;
use crate::hal::HalError;
use crate::resource::ResourceError;
use crate::store::StoreError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error returned from `init()` or `stop()`.
#[derive(Debug, Error)]
pub enum ModuleError {
    /// Resource acquisition or release failed.
    #[error(transparent)]
    Resource(#[from] ResourceError),

    /// Pin driver failure.
    #[error(transparent)]
    Hal(#[from] HalError),

    /// Settings could not be loaded or saved.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Module-specific failure.
    #[error("{0}")]
    Other(String),
}

impl ModuleError {
    /// Module-specific failure from a message.
    pub fn other(msg: impl Into<String>) -> Self {
        ModuleError::Other(msg.into())
    }
}

/// Lifecycle state of a registered module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleState {
    /// Constructed and registered, not yet initialized.
    #[default]
    Registered,
    /// `init()` returned successfully.
    Initialized,
    /// `start()` launched and not yet returned.
    Running,
    /// `start()` returned (or faulted) and the module is inactive.
    Stopped,
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ModuleState::Registered => "registered",
            ModuleState::Initialized => "initialized",
            ModuleState::Running => "running",
            ModuleState::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

/// An independently lifecycle-managed unit.
///
/// A module exclusively owns every resource handle and driver it acquires
/// in `init()` and must release them in `stop()`.
#[async_trait]
pub trait Module: Send + 'static {
    /// Stable, non-empty, process-unique identifier.
    fn name(&self) -> &str;

    /// Configure the module and claim its resources.
    ///
    /// # Errors
    /// Any error is fatal: the engine aborts the boot sequence.
    fn init(&mut self) -> Result<(), ModuleError>;

    /// Main logic. Daemons loop until `token` is cancelled; short-lived
    /// modules may do their work and return.
    ///
    /// Must suspend on the token, a subscription or a timer. A panic here
    /// is isolated to this module.
    async fn start(&mut self, token: CancelToken);

    /// Release hardware and flush state.
    ///
    /// # Errors
    /// Errors are logged; shutdown continues with the next module.
    fn stop(&mut self) -> Result<(), ModuleError>;
}
