//! Durable key/value store port
//!
//! Holds the few strings that outlive a process: the bearer token and the
//! user's preferences. Every write is broadcast so that all contexts sharing
//! the store observe it.

use async_trait::async_trait;
use tokio::sync::broadcast;

/// A change to one key, as observed by other contexts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    /// The key that changed.
    pub key: String,
    /// The new value, or `None` if the key was removed.
    pub new_value: Option<String>,
}

impl StorageChange {
    /// Creates a change notice.
    #[must_use]
    pub fn new(key: impl Into<String>, new_value: Option<String>) -> Self {
        Self {
            key: key.into(),
            new_value,
        }
    }
}

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The store cannot be located or opened.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// Port for the durable client-side store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a key.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Writes a key and broadcasts the change.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removes a key and broadcasts the change. Removing a missing key is
    /// not an error.
    ///
    /// # Errors
    /// Returns an error if the backing storage cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// Subscribes to changes made through any handle on the same store.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}
