//! HTTP transport port

use std::future::Future;

use storefront_domain::{ApiRequest, ApiResponse};

/// Errors raised before an HTTP response was received.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The URL could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// Connection could not be established.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The request timed out.
    #[error("Request timed out")]
    Timeout,

    /// Any other transport failure.
    #[error("{0}")]
    Other(String),
}

/// Port for sending API requests.
///
/// Decorators such as the auth interceptor implement this trait too, so a
/// transport stack is composed by wrapping.
pub trait HttpTransport: Send + Sync {
    /// Sends a request and returns the response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns an error only when no response was received.
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send;
}
