//! Storefront Domain - Core types
//!
//! This crate defines the domain model for the storefront session client.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod config;
pub mod error;
pub mod profile;
pub mod redirect;
pub mod registration;
pub mod request;
pub mod response;

pub use auth::{AuthError, Credentials, SessionState, TokenGrant, TokenSet, UserInfo};
pub use config::{AppConfig, KeycloakConfig};
pub use error::{DomainError, DomainResult};
pub use profile::{OrderSummary, UserProfile};
pub use redirect::LoginRedirect;
pub use registration::{
    RegistrationForm, RegistrationRequest, RegistrationStep, RegistrationWizard, ValidationIssue,
};
pub use request::{ApiRequest, HttpMethod};
pub use response::ApiResponse;
