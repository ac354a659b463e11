//! Identity provider port

use std::future::Future;

use storefront_domain::{AuthError, Credentials, TokenGrant, UserInfo};

/// Port for the identity provider's OpenID Connect endpoints.
///
/// Implementations classify failures into `AuthError` variants: status `0`
/// (no response) is `AuthError::Network`.
pub trait IdentityProvider: Send + Sync {
    /// Exchanges username and password for tokens (password grant).
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` on 400/401, `Network` on transport failure,
    /// `Unclassified` otherwise.
    fn password_grant(
        &self,
        credentials: &Credentials,
    ) -> impl Future<Output = Result<TokenGrant, AuthError>> + Send;

    /// Exchanges a refresh token for a new token set.
    ///
    /// # Errors
    ///
    /// `RefreshFailed` when the grant is rejected, `Network` on transport
    /// failure.
    fn refresh_grant(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<TokenGrant, AuthError>> + Send;

    /// Fetches the user-info document for an access token.
    ///
    /// # Errors
    ///
    /// `Network` on transport failure, `Unclassified` on any error status.
    fn user_info(
        &self,
        access_token: &str,
    ) -> impl Future<Output = Result<UserInfo, AuthError>> + Send;

    /// Ends the identity provider session bound to a refresh token.
    ///
    /// # Errors
    ///
    /// Any failure; callers treat this as best-effort.
    fn end_session(
        &self,
        refresh_token: &str,
    ) -> impl Future<Output = Result<(), AuthError>> + Send;
}
