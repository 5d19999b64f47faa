//! Resource lock manager.
//!
//! Grants exclusive ownership of `(class, id)` keys to module names so two
//! modules never drive the same pin or bus. One mutex guards one flat map;
//! every critical section is a single hash lookup with no I/O.

use modus_common::resource::{ResourceClass, ResourceError, ResourceId, ResourceKey};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, error, warn};

/// One held lock, as reported in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResourceLease {
    /// Stable numeric class code.
    pub class_code: u8,
    /// Resource class.
    pub class: ResourceClass,
    /// Resource id within the class.
    pub id: ResourceId,
    /// Owning module.
    pub owner: String,
}

/// Table of resource owners.
#[derive(Debug, Default)]
pub struct ResourceManager {
    locks: Mutex<HashMap<ResourceKey, String>>,
}

impl ResourceManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim exclusive access to a resource.
    ///
    /// # Errors
    /// `ResourceError::Conflict` if any owner holds the key, including
    /// `owner` itself.
    pub fn lock(
        &self,
        class: ResourceClass,
        id: ResourceId,
        owner: &str,
    ) -> Result<(), ResourceError> {
        let key = ResourceKey::new(class, id);
        let mut locks = self.locks.lock();

        if let Some(current_owner) = locks.get(&key) {
            let err = ResourceError::Conflict {
                key,
                current_owner: current_owner.clone(),
                requested_by: owner.to_string(),
            };
            drop(locks);
            error!("{err}");
            return Err(err);
        }

        locks.insert(key, owner.to_string());
        drop(locks);
        debug!("Resource locked: {key} by '{owner}'");
        Ok(())
    }

    /// Release a resource held by `owner`.
    ///
    /// # Errors
    /// - `ResourceError::NotLocked` if nobody holds the key
    /// - `ResourceError::OwnershipViolation` if someone else holds it; the
    ///   lock stays with its owner
    pub fn unlock(
        &self,
        class: ResourceClass,
        id: ResourceId,
        owner: &str,
    ) -> Result<(), ResourceError> {
        let key = ResourceKey::new(class, id);
        let mut locks = self.locks.lock();

        match locks.get(&key) {
            None => {
                drop(locks);
                debug!("Unlock of free resource {key} by '{owner}'");
                Err(ResourceError::NotLocked { key })
            }
            Some(current_owner) if current_owner != owner => {
                let err = ResourceError::OwnershipViolation {
                    key,
                    current_owner: current_owner.clone(),
                    requested_by: owner.to_string(),
                };
                drop(locks);
                warn!("Security: {err}");
                Err(err)
            }
            Some(_) => {
                locks.remove(&key);
                drop(locks);
                debug!("Resource unlocked: {key} by '{owner}'");
                Ok(())
            }
        }
    }

    /// Whether a resource is held.
    pub fn is_locked(&self, class: ResourceClass, id: ResourceId) -> bool {
        self.locks
            .lock()
            .contains_key(&ResourceKey::new(class, id))
    }

    /// Current owner, if any.
    pub fn owner(&self, class: ResourceClass, id: ResourceId) -> Option<String> {
        self.locks
            .lock()
            .get(&ResourceKey::new(class, id))
            .cloned()
    }

    /// Keys held by `owner`, sorted.
    pub fn locked_by(&self, owner: &str) -> Vec<ResourceKey> {
        let mut keys: Vec<ResourceKey> = self
            .locks
            .lock()
            .iter()
            .filter(|(_, o)| o.as_str() == owner)
            .map(|(k, _)| *k)
            .collect();
        keys.sort();
        keys
    }

    /// Every held lock, sorted by key.
    pub fn snapshot(&self) -> Vec<ResourceLease> {
        let mut entries: Vec<(ResourceKey, String)> = self
            .locks
            .lock()
            .iter()
            .map(|(k, o)| (*k, o.clone()))
            .collect();
        entries.sort();
        entries
            .into_iter()
            .map(|(key, owner)| ResourceLease {
                class_code: key.class.code(),
                class: key.class,
                id: key.id,
                owner,
            })
            .collect()
    }

    /// Number of held locks.
    pub fn len(&self) -> usize {
        self.locks.lock().len()
    }

    /// Whether no lock is held.
    pub fn is_empty(&self) -> bool {
        self.locks.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ResourceClass::*;

    #[test]
    fn lock_conflict_unlock_relock() {
        let mgr = ResourceManager::new();
        mgr.lock(Gpio, 13, "led").unwrap();

        let err = mgr.lock(Gpio, 13, "button").unwrap_err();
        assert!(matches!(
            err,
            ResourceError::Conflict { ref current_owner, .. } if current_owner == "led"
        ));

        mgr.unlock(Gpio, 13, "led").unwrap();
        mgr.lock(Gpio, 13, "button").unwrap();
        assert_eq!(mgr.owner(Gpio, 13).as_deref(), Some("button"));
    }

    #[test]
    fn relock_by_same_owner_conflicts() {
        let mgr = ResourceManager::new();
        mgr.lock(Spi, 0, "display").unwrap();
        let err = mgr.lock(Spi, 0, "display").unwrap_err();
        assert!(matches!(err, ResourceError::Conflict { .. }));
    }

    #[test]
    fn unlock_by_stranger_is_violation() {
        let mgr = ResourceManager::new();
        mgr.lock(I2c, 1, "imu").unwrap();

        let err = mgr.unlock(I2c, 1, "rogue").unwrap_err();
        assert!(matches!(
            err,
            ResourceError::OwnershipViolation { ref current_owner, ref requested_by, .. }
                if current_owner == "imu" && requested_by == "rogue"
        ));
        assert_eq!(mgr.owner(I2c, 1).as_deref(), Some("imu"));
    }

    #[test]
    fn unlock_free_is_not_locked() {
        let mgr = ResourceManager::new();
        let err = mgr.unlock(Uart, 2, "modem").unwrap_err();
        assert_eq!(
            err,
            ResourceError::NotLocked {
                key: ResourceKey::new(Uart, 2)
            }
        );
    }

    #[test]
    fn classes_are_independent() {
        let mgr = ResourceManager::new();
        mgr.lock(Gpio, 1, "a").unwrap();
        mgr.lock(Pwm, 1, "b").unwrap();
        assert!(mgr.is_locked(Gpio, 1));
        assert!(mgr.is_locked(Pwm, 1));
        assert!(!mgr.is_locked(Adc, 1));
        assert_eq!(mgr.owner(Adc, 1), None);
    }

    #[test]
    fn locked_by_and_snapshot() {
        let mgr = ResourceManager::new();
        mgr.lock(Timer, 2, "poller").unwrap();
        mgr.lock(Gpio, 4, "poller").unwrap();
        mgr.lock(Dma, 0, "audio").unwrap();

        assert_eq!(
            mgr.locked_by("poller"),
            vec![ResourceKey::new(Gpio, 4), ResourceKey::new(Timer, 2)]
        );

        let snap = mgr.snapshot();
        assert_eq!(snap.len(), 3);
        assert_eq!(snap[0].class_code, 0);
        assert_eq!(snap[2].class_code, 7);
        assert_eq!(snap[2].owner, "audio");
        assert_eq!(mgr.len(), 3);
    }
}
