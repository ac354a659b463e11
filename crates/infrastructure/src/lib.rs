//! Storefront Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod persistence;
pub mod serialization;

#[cfg(any(test, feature = "test-util"))]
pub use adapters::ManualClock;
pub use adapters::{ReqwestTransport, SystemClock};
pub use auth::KeycloakProvider;
pub use config::{ConfigLoadError, load_config};
pub use persistence::{
    FileKeyValueStore, MemoryKeyValueStore, TokioFileSystem, default_storage_path,
};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
