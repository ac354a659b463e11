//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the session core and external systems.
//! Each port is a trait implemented by adapters in the infrastructure layer.

mod clock;
mod file_system;
mod http_transport;
mod identity_provider;
mod key_value_store;

pub use clock::Clock;
pub use file_system::{FileSystem, FileSystemError};
pub use http_transport::{HttpTransport, TransportError};
pub use identity_provider::IdentityProvider;
pub use key_value_store::{KeyValueStore, StorageError};
