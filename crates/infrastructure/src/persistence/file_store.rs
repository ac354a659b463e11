//! File-backed key-value storage.
//!
//! All entries live in one JSON document:
//! ```json
//! {
//!   "schema_version": 1,
//!   "entries": {
//!     "access_token": "eyJ...",
//!     "refresh_token": "eyJ...",
//!     "token_expiry": "1750000300000"
//!   }
//! }
//! ```
//! Writes go to a temporary sibling first and are renamed into place.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use storefront_application::ports::{FileSystem, FileSystemError, KeyValueStore, StorageError};
use tokio::sync::Mutex;

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

/// Current schema version of the storage document.
pub const SCHEMA_VERSION: u32 = 1;

/// File name used under the storage directory.
pub const SESSION_FILE: &str = "session.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct StorageDocument {
    schema_version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// Default storage file: `<storage_dir>/session.json`, or the platform data
/// directory when no storage dir is configured.
#[must_use]
pub fn default_storage_path(storage_dir: Option<&Path>) -> Option<PathBuf> {
    storage_dir
        .map(Path::to_path_buf)
        .or_else(|| dirs::data_dir().map(|dir| dir.join("storefront")))
        .map(|dir| dir.join(SESSION_FILE))
}

fn io_error(error: FileSystemError) -> StorageError {
    StorageError::Io(error.into())
}

/// Key-value storage persisted to a JSON file.
#[derive(Debug)]
pub struct FileKeyValueStore<F> {
    fs: F,
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl<F: FileSystem> FileKeyValueStore<F> {
    /// Creates a store backed by the file at `path`.
    pub fn new(fs: F, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    async fn read_document(&self) -> Result<StorageDocument, StorageError> {
        if !self.fs.exists(&self.path).await {
            return Ok(StorageDocument {
                schema_version: SCHEMA_VERSION,
                entries: BTreeMap::new(),
            });
        }

        let content = self.fs.read_file(&self.path).await.map_err(io_error)?;
        let document: StorageDocument = from_json_bytes(&content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if document.schema_version != SCHEMA_VERSION {
            return Err(StorageError::Serialization(format!(
                "unsupported schema version {} in {}",
                document.schema_version,
                self.path.display()
            )));
        }
        Ok(document)
    }

    async fn write_document(&self, document: &StorageDocument) -> Result<(), StorageError> {
        let content = to_json_stable_bytes(document)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let temp = self.temp_path();

        self.fs.write_file(&temp, &content).await.map_err(io_error)?;
        self.fs.rename(&temp, &self.path).await.map_err(io_error)
    }

    /// Applies `change` to the stored entries as one read-modify-write.
    async fn update<M>(&self, change: M) -> Result<(), StorageError>
    where
        M: FnOnce(&mut BTreeMap<String, String>) + Send,
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.read_document().await?;
        change(&mut document.entries);
        self.write_document(&document).await
    }
}

#[async_trait]
impl<F: FileSystem> KeyValueStore for FileKeyValueStore<F> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let mut document = self.read_document().await?;
        Ok(document.entries.remove(key))
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        self.update(|stored| {
            for (key, value) in entries {
                stored.insert((*key).to_string(), value.clone());
            }
        })
        .await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|stored| {
            for key in keys {
                stored.remove(*key);
            }
        })
        .await
    }
}
