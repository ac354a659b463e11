//! Durable key-value storage port

use async_trait::async_trait;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// String key-value storage that survives restarts.
///
/// Multi-key writes and removals are applied together, so readers never see
/// half of a batch.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes several values in one batch.
    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError>;

    /// Removes several keys in one batch. Missing keys are ignored.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError>;

    /// Writes a single value.
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.set_many(&[(key, value)]).await
    }

    /// Removes a single key.
    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_many(&[key]).await
    }
}
