//! Storefront Application - Session core and ports
//!
//! This crate defines the application layer with:
//! - Port traits (identity provider, HTTP transport, key-value storage, clock)
//! - The session core: token store, session state holder, auth client and
//!   bearer credential interceptor
//! - Profile and registration use cases
//! - Application-level error handling

pub mod auth;
pub mod error;
pub mod ports;
pub mod use_cases;

#[cfg(test)]
mod test_support;

pub use auth::{
    AuthClient, AuthInterceptor, SessionStateHolder, SubscriptionId, TokenStatus, TokenStore,
};
pub use error::{ApplicationError, ApplicationResult};
pub use ports::{
    Clock, HttpTransport, IdentityProvider, KeyValueStore, StorageError, TransportError,
};
pub use use_cases::{ProfileService, RegistrationService};
