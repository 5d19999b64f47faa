//! Process-scoped context shared with every module.
//!
//! Built once by the [`Engine`](crate::engine::Engine) and cloned into module
//! constructors. Cloning is cheap: every field is reference counted.

use crate::bus::EventBus;
use crate::resource::ResourceManager;
use crate::services::ServiceLocator;
use crate::settings::SettingsManager;
use modus_common::cancel::CancelToken;
use std::sync::Arc;
use tracing::{debug, info};

/// Cloneable trigger for a graceful shutdown.
///
/// Every clone drives the same engine. Only the first request has an
/// effect; later ones are ignored.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    token: CancelToken,
}

impl ShutdownHandle {
    /// Request shutdown. Returns `true` for the request that took effect.
    pub fn shutdown(&self) -> bool {
        let first = self.token.cancel();
        if first {
            info!("Shutdown requested");
        } else {
            debug!("Shutdown already in progress");
        }
        first
    }

    /// Whether shutdown was requested.
    pub fn is_requested(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait until shutdown is requested.
    pub async fn wait(&self) {
        self.token.cancelled().await;
    }

    pub(crate) fn token(&self) -> &CancelToken {
        &self.token
    }
}

/// Shared collaborators handed to modules.
#[derive(Debug, Clone)]
pub struct Context {
    /// Resource lock manager.
    pub resources: Arc<ResourceManager>,
    /// Event bus.
    pub bus: Arc<EventBus>,
    /// Named services.
    pub services: Arc<ServiceLocator>,
    /// Persisted settings, absent when no store is configured.
    pub settings: Option<Arc<SettingsManager>>,
    /// Shutdown trigger.
    pub shutdown: ShutdownHandle,
}

impl Context {
    /// Context with fresh collaborators and a bus of `queue_capacity`.
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            resources: Arc::new(ResourceManager::new()),
            bus: Arc::new(EventBus::with_capacity(queue_capacity)),
            services: Arc::new(ServiceLocator::new()),
            settings: None,
            shutdown: ShutdownHandle::default(),
        }
    }

    /// Attach a settings manager.
    pub fn with_settings(mut self, settings: Arc<SettingsManager>) -> Self {
        self.settings = Some(settings);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn clones_share_collaborators() {
        let ctx = Context::new(4);
        let other = ctx.clone();
        assert!(Arc::ptr_eq(&ctx.resources, &other.resources));
        assert!(Arc::ptr_eq(&ctx.bus, &other.bus));
        assert_eq!(other.bus.capacity(), 4);
        assert!(ctx.settings.is_none());
    }

    #[test]
    fn shutdown_is_idempotent_across_clones() {
        let ctx = Context::new(1);
        let handle = ctx.shutdown.clone();
        assert!(!ctx.shutdown.is_requested());
        assert!(handle.shutdown());
        assert!(!ctx.shutdown.shutdown());
        assert!(ctx.shutdown.is_requested());
    }

    #[test]
    fn with_settings_attaches_manager() {
        let settings = Arc::new(SettingsManager::new(Arc::new(MemoryStore::new())));
        let ctx = Context::new(1).with_settings(settings);
        assert!(ctx.settings.is_some());
    }

    #[tokio::test]
    async fn wait_returns_after_shutdown() {
        let handle = ShutdownHandle::default();
        let waiter = {
            let h = handle.clone();
            tokio::spawn(async move { h.wait().await })
        };
        tokio::task::yield_now().await;
        handle.shutdown();
        tokio::time::timeout(std::time::Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake")
            .unwrap();
    }
}
