//! Settings manager - typed persistence over a [`ConfigStore`].
//!
//! Bridges the raw byte store and module settings structs. Blobs are JSON
//! encoded; an empty blob counts as "nothing saved".

use modus_common::store::{ConfigStore, StoreError};
use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Typed load/save of persisted settings.
pub struct SettingsManager {
    store: Arc<dyn ConfigStore>,
    // Serializes save and clear: a file store reuses one temp path per blob.
    writes: Mutex<()>,
}

impl std::fmt::Debug for SettingsManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsManager").finish_non_exhaustive()
    }
}

impl SettingsManager {
    /// Manager over `store`.
    pub fn new(store: Arc<dyn ConfigStore>) -> Self {
        Self {
            store,
            writes: Mutex::new(()),
        }
    }

    /// Decode the stored settings.
    ///
    /// # Errors
    /// - `StoreError::NotFound` if nothing (or an empty blob) is stored
    /// - `StoreError::Codec` if the blob does not decode as `T`
    pub fn load<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let data = self.store.load()?;
        if data.is_empty() {
            return Err(StoreError::NotFound);
        }

        let value = serde_json::from_slice(&data).map_err(|e| {
            error!("Settings: failed to decode configuration: {e}");
            StoreError::Codec(e.to_string())
        })?;
        debug!("Settings loaded ({} bytes)", data.len());
        Ok(value)
    }

    /// Encode and persist `value`.
    pub fn save<T: Serialize>(&self, value: &T) -> Result<(), StoreError> {
        let data = serde_json::to_vec(value).map_err(|e| StoreError::Codec(e.to_string()))?;
        let _guard = self.writes.lock();
        if let Err(e) = self.store.save(&data) {
            error!("Settings: failed to write to storage: {e}");
            return Err(e);
        }
        info!("Settings saved ({} bytes)", data.len());
        Ok(())
    }

    /// Erase persisted settings (factory reset).
    pub fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.writes.lock();
        self.store.clear()?;
        info!("Settings cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde::Deserialize;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct LedSettings {
        mode: u8,
        brightness: u16,
    }

    fn manager() -> (Arc<MemoryStore>, SettingsManager) {
        let store = Arc::new(MemoryStore::new());
        let manager = SettingsManager::new(store.clone());
        (store, manager)
    }

    #[test]
    fn save_then_load() {
        let (_, settings) = manager();
        let value = LedSettings {
            mode: 2,
            brightness: 512,
        };
        settings.save(&value).unwrap();
        assert_eq!(settings.load::<LedSettings>().unwrap(), value);
    }

    #[test]
    fn empty_store_is_not_found() {
        let (store, settings) = manager();
        assert!(matches!(
            settings.load::<LedSettings>(),
            Err(StoreError::NotFound)
        ));
        store.save(b"").unwrap();
        assert!(matches!(
            settings.load::<LedSettings>(),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn garbage_is_codec_error() {
        let (store, settings) = manager();
        store.save(b"\xff\x00not json").unwrap();
        assert!(matches!(
            settings.load::<LedSettings>(),
            Err(StoreError::Codec(_))
        ));
    }

    #[test]
    fn clear_resets() {
        let (_, settings) = manager();
        settings.save(&LedSettings { mode: 1, brightness: 1 }).unwrap();
        settings.clear().unwrap();
        assert!(matches!(
            settings.load::<LedSettings>(),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn concurrent_saves_to_file_store_stay_decodable() {
        let dir = tempfile::TempDir::new().unwrap();
        let settings = SettingsManager::new(Arc::new(crate::store::FileStore::new(
            dir.path().join("settings.json"),
        )));

        std::thread::scope(|s| {
            for mode in 0..8u8 {
                let settings = &settings;
                s.spawn(move || {
                    for brightness in 0..20u16 {
                        settings.save(&LedSettings { mode, brightness }).unwrap();
                    }
                });
            }
        });

        let last: LedSettings = settings.load().unwrap();
        assert!(last.mode < 8);
        assert_eq!(last.brightness, 19);
    }
}
