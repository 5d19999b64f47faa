//! Lifecycle engine.
//!
//! Drives every registered module through init, concurrent start and stop:
//!
//! ```text
//! Created ──run()──► Initializing ──all ok──► Running ──shutdown──► ShuttingDown ──► Stopped
//!                         │
//!                         └── init failed ──► Stopped (run returns InitFailed)
//! ```
//!
//! Each module's `start()` runs in its own task behind a supervisor task.
//! A panic inside `start()` ends only that module: the supervisor logs it,
//! marks the module stopped and the engine carries on. `stop()` gets the
//! same boundary: a panic there is recorded as a stop failure and the
//! remaining modules are still stopped.
//!
//! # Grace Period
//!
//! With `shutdown_grace_ms` unset the engine waits for every `start()` to
//! return. With it set, tasks still running at the deadline are aborted.
//! Abort takes effect at the task's next yield point, so a module that
//! never yields still blocks shutdown.

use crate::context::{Context, ShutdownHandle};
use crate::registry::{ModuleEntry, ModuleRegistry, RegistryError};
use crate::settings::SettingsManager;
use modus_common::cancel::CancelToken;
use modus_common::config::{EngineSection, ModusConfig};
use modus_common::module::{Module, ModuleError, ModuleState};
use modus_common::store::ConfigStore;
use serde::Serialize;
use std::any::Any;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::{debug, error, info, warn};

/// Engine lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// Constructed, accepting registrations.
    Created,
    /// Running `init()` on each module.
    Initializing,
    /// Modules started, waiting for a shutdown request.
    Running,
    /// Joining tasks and stopping modules.
    ShuttingDown,
    /// Finished.
    Stopped,
}

/// Fatal engine errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A module failed to initialize; nothing was started.
    #[error("module '{module}' failed to initialize: {source}")]
    InitFailed {
        /// Failing module.
        module: String,
        /// Error returned by `init()`.
        #[source]
        source: ModuleError,
    },

    /// `run` was already called on this engine.
    #[error("engine already started")]
    AlreadyStarted,
}

/// A `stop()` call that returned an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopFailure {
    /// Module name.
    pub module: String,
    /// Rendered error.
    pub error: String,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Modules whose `start()` was launched, in registration order.
    pub started: Vec<String>,
    /// Modules whose `start()` panicked.
    pub faulted: Vec<String>,
    /// Modules aborted after the grace period.
    pub aborted: Vec<String>,
    /// Failed or panicking `stop()` calls, in registration order.
    pub stop_failures: Vec<StopFailure>,
}

impl RunReport {
    /// No fault, no abort and no stop failure.
    pub fn is_clean(&self) -> bool {
        self.faulted.is_empty() && self.aborted.is_empty() && self.stop_failures.is_empty()
    }
}

/// How a supervised `start()` ended.
#[derive(Debug)]
enum ModuleExit {
    Returned,
    Faulted,
    Aborted,
}

struct Supervised {
    name: String,
    handle: JoinHandle<ModuleExit>,
    abort: AbortHandle,
}

/// Module coordinator.
#[derive(Debug)]
pub struct Engine {
    config: EngineSection,
    context: Context,
    registry: ModuleRegistry,
    state: EngineState,
}

impl Engine {
    /// Engine configured from `config`, with fresh collaborators.
    pub fn new(config: &ModusConfig) -> Self {
        Self {
            config: config.engine.clone(),
            context: Context::new(config.engine.queue_capacity),
            registry: ModuleRegistry::new(),
            state: EngineState::Created,
        }
    }

    /// Persist module settings through `store`.
    ///
    /// Call before handing the context to module constructors.
    pub fn with_settings_store(mut self, store: Arc<dyn ConfigStore>) -> Self {
        self.context = self
            .context
            .with_settings(Arc::new(SettingsManager::new(store)));
        self
    }

    /// Collaborators to clone into module constructors.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Registered modules.
    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    /// Handle that requests shutdown from anywhere.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.context.shutdown.clone()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Register a module. See [`ModuleRegistry::register`].
    pub fn register<M: Module>(&mut self, module: M) -> Result<(), RegistryError> {
        self.registry.register(module)
    }

    /// Register an already boxed module.
    pub fn register_boxed(&mut self, module: Box<dyn Module>) -> Result<(), RegistryError> {
        self.registry.register_boxed(module)
    }

    /// Run until a [`ShutdownHandle`] requests shutdown.
    pub async fn run(&mut self) -> Result<RunReport, EngineError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until `signal` completes or a [`ShutdownHandle`] requests
    /// shutdown, whichever comes first.
    ///
    /// # Errors
    /// - `EngineError::AlreadyStarted` on any call after the first
    /// - `EngineError::InitFailed` if a module fails `init()`; no module is
    ///   started and none is stopped
    pub async fn run_until<F>(&mut self, signal: F) -> Result<RunReport, EngineError>
    where
        F: Future<Output = ()>,
    {
        if self.state != EngineState::Created {
            return Err(EngineError::AlreadyStarted);
        }

        self.state = EngineState::Initializing;
        if let Err(e) = self.init_all().await {
            self.state = EngineState::Stopped;
            return Err(e);
        }

        self.state = EngineState::Running;
        let token = self.context.shutdown.token().clone();
        let supervised: Vec<Supervised> = self
            .registry
            .entries()
            .iter()
            .map(|entry| supervise(entry, token.clone()))
            .collect();
        let mut report = RunReport {
            started: supervised.iter().map(|s| s.name.clone()).collect(),
            ..RunReport::default()
        };
        info!("Engine running with {} module(s)", supervised.len());

        tokio::select! {
            _ = token.cancelled() => {}
            _ = signal => info!("Termination signal received"),
        }

        self.state = EngineState::ShuttingDown;
        self.context.shutdown.shutdown();
        info!("Shutting down");

        self.join_all(supervised, &mut report).await;
        self.stop_all(&mut report).await;

        self.state = EngineState::Stopped;
        info!(
            "Engine stopped ({} faulted, {} aborted, {} stop failure(s))",
            report.faulted.len(),
            report.aborted.len(),
            report.stop_failures.len()
        );
        Ok(report)
    }

    async fn init_all(&self) -> Result<(), EngineError> {
        info!("Initializing {} module(s)", self.registry.len());
        for entry in self.registry.entries() {
            let mut module = entry.module.lock().await;
            if let Err(source) = module.init() {
                error!("Module '{}' failed to initialize: {source}", entry.name);
                return Err(EngineError::InitFailed {
                    module: entry.name.clone(),
                    source,
                });
            }
            entry.set_state(ModuleState::Initialized);
            debug!("Module '{}' initialized", entry.name);
        }
        Ok(())
    }

    async fn join_all(&self, supervised: Vec<Supervised>, report: &mut RunReport) {
        let deadline = self
            .config
            .shutdown_grace()
            .map(|grace| tokio::time::Instant::now() + grace);

        for Supervised {
            name,
            mut handle,
            abort,
        } in supervised
        {
            let joined = match deadline {
                None => (&mut handle).await,
                Some(deadline) => match tokio::time::timeout_at(deadline, &mut handle).await {
                    Ok(joined) => joined,
                    Err(_) => {
                        warn!("Module '{name}' still running after grace period, aborting");
                        abort.abort();
                        (&mut handle).await
                    }
                },
            };

            match joined {
                Ok(ModuleExit::Returned) => {}
                Ok(ModuleExit::Faulted) => report.faulted.push(name),
                Ok(ModuleExit::Aborted) => report.aborted.push(name),
                Err(e) => error!("Supervisor of module '{name}' failed: {e}"),
            }
        }
    }

    async fn stop_all(&self, report: &mut RunReport) {
        for entry in self.registry.entries() {
            let mut module = entry.module.lock().await;
            let failure = match panic::catch_unwind(AssertUnwindSafe(|| module.stop())) {
                Ok(Ok(())) => None,
                Ok(Err(e)) => {
                    error!("Module '{}' failed to stop: {e}", entry.name);
                    Some(e.to_string())
                }
                Err(payload) => {
                    let msg = panic_message(payload);
                    error!("Module '{}' panicked in stop: {msg}", entry.name);
                    Some(format!("panicked: {msg}"))
                }
            };
            match failure {
                None => debug!("Module '{}' stopped", entry.name),
                Some(error) => report.stop_failures.push(StopFailure {
                    module: entry.name.clone(),
                    error,
                }),
            }
            entry.set_state(ModuleState::Stopped);
        }
    }
}

/// Spawn `start()` for one module behind a supervisor task.
fn supervise(entry: &ModuleEntry, token: CancelToken) -> Supervised {
    entry.set_state(ModuleState::Running);

    let module = Arc::clone(&entry.module);
    let inner = tokio::spawn(async move {
        let mut module = module.lock_owned().await;
        module.start(token).await;
    });
    let abort = inner.abort_handle();

    let name = entry.name.clone();
    let state = Arc::clone(&entry.state);
    let task_name = name.clone();
    let handle = tokio::spawn(async move {
        let exit = match inner.await {
            Ok(()) => {
                debug!("Module '{task_name}' returned from start");
                ModuleExit::Returned
            }
            Err(e) if e.is_panic() => {
                let msg = panic_message(e.into_panic());
                error!("Module '{task_name}' faulted: {msg}");
                ModuleExit::Faulted
            }
            Err(_) => {
                warn!("Module '{task_name}' aborted");
                ModuleExit::Aborted
            }
        };
        *state.lock() = ModuleState::Stopped;
        exit
    });

    Supervised {
        name,
        handle,
        abort,
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
