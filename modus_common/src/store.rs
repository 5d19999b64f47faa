//! Persistent configuration store contract.
//!
//! A store holds one opaque byte blob (NVS partition, EEPROM page, file).
//! Decoding is the settings manager's job, never the store's.

use thiserror::Error;

/// Errors returned by stores and the settings manager.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store is empty or was cleared.
    #[error("configuration not found")]
    NotFound,

    /// Underlying storage failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Blob could not be encoded or decoded.
    #[error("configuration codec error: {0}")]
    Codec(String),
}

/// Persistence layer for configuration bytes.
pub trait ConfigStore: Send + Sync {
    /// Read the stored blob.
    ///
    /// # Errors
    /// `StoreError::NotFound` if nothing was saved.
    fn load(&self) -> Result<Vec<u8>, StoreError>;

    /// Replace the stored blob. Implementations should be atomic with
    /// respect to power loss.
    fn save(&self, data: &[u8]) -> Result<(), StoreError>;

    /// Erase the stored blob (factory reset).
    fn clear(&self) -> Result<(), StoreError>;
}
