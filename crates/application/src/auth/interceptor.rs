//! Bearer credential interceptor.
//!
//! Wraps any [`HttpTransport`] and decides, once per request, whether to
//! attach the stored access token, refresh it first, or leave the request
//! alone.

use std::future::Future;
use std::sync::Arc;

use storefront_domain::auth::bearer;
use storefront_domain::request::AUTHORIZATION;
use storefront_domain::{ApiRequest, ApiResponse};

use super::client::AuthClient;
use crate::ports::{Clock, HttpTransport, IdentityProvider, KeyValueStore, TransportError};

/// Returns true for identity provider URLs, which are never given a bearer
/// token by the interceptor.
#[must_use]
pub fn is_identity_provider_url(url: &str) -> bool {
    url.contains("/realms/") || url.contains("/protocol/openid-connect")
}

/// Transport decorator that attaches and refreshes bearer credentials.
pub struct AuthInterceptor<T, P, S, C> {
    inner: T,
    auth: Arc<AuthClient<P, S, C>>,
}

impl<T, P, S, C> AuthInterceptor<T, P, S, C>
where
    T: HttpTransport,
    P: IdentityProvider + 'static,
    S: KeyValueStore,
    C: Clock,
{
    /// Wraps `inner`, reading tokens through `auth`.
    #[must_use]
    pub const fn new(inner: T, auth: Arc<AuthClient<P, S, C>>) -> Self {
        Self { inner, auth }
    }

    /// The wrapped transport.
    #[must_use]
    pub const fn inner(&self) -> &T {
        &self.inner
    }

    /// Applies the credential policy to a request.
    ///
    /// Never fails: a refresh failure signs the user out and the request goes
    /// on without credentials.
    pub async fn authorize(&self, request: ApiRequest) -> ApiRequest {
        if is_identity_provider_url(&request.url) {
            tracing::debug!(url = %request.url, "identity provider request, passing through");
            return request;
        }

        let Some(token) = self.auth.access_token().await else {
            tracing::debug!(url = %request.url, "no stored token, sending anonymously");
            return request;
        };

        if !self.auth.is_expiring_soon().await {
            return request.with_header(AUTHORIZATION, bearer(&token));
        }

        tracing::debug!(url = %request.url, "access token expiring, refreshing first");
        match self.auth.refresh().await {
            Ok(tokens) => request.with_header(AUTHORIZATION, tokens.authorization_header()),
            Err(e) => {
                tracing::warn!(url = %request.url, error = %e, "token refresh failed, sending without credentials");
                self.auth.logout().await;
                request
            }
        }
    }
}

impl<T, P, S, C> HttpTransport for AuthInterceptor<T, P, S, C>
where
    T: HttpTransport,
    P: IdentityProvider + 'static,
    S: KeyValueStore,
    C: Clock,
{
    fn send(
        &self,
        request: ApiRequest,
    ) -> impl Future<Output = Result<ApiResponse, TransportError>> + Send {
        async move {
            let request = self.authorize(request).await;
            self.inner.send(request).await
        }
    }
}
