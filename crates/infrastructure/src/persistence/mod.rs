//! Persistence adapters: file system access and key-value storage.

mod file_store;
mod file_system;
mod memory_store;

pub use file_store::{FileKeyValueStore, SCHEMA_VERSION, SESSION_FILE, default_storage_path};
pub use file_system::TokioFileSystem;
pub use memory_store::MemoryKeyValueStore;
