//! Application error types

use storefront_domain::{AuthError, DomainError, ValidationIssue};
use thiserror::Error;

use crate::ports::{StorageError, TransportError};

/// Application-level errors.
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Authentication failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// No response was received.
    #[error("HTTP error: {0}")]
    Transport(#[from] TransportError),

    /// A storage operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// The backend answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// A response body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),

    /// Submitted form data failed validation.
    #[error("invalid input: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
