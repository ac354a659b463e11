//! Customer profile use case.

use storefront_domain::config::join_url_segment;
use storefront_domain::{ApiRequest, UserProfile};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::HttpTransport;

/// Reads customer profiles from the storefront backend.
///
/// Meant to run on top of the auth interceptor so the bearer token is
/// attached.
pub struct ProfileService<T> {
    transport: T,
    api_url: String,
}

impl<T: HttpTransport> ProfileService<T> {
    /// Creates the service against the backend at `api_url`.
    pub fn new(transport: T, api_url: impl Into<String>) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
        }
    }

    /// Fetches `GET {api_url}/usuarios/{id}`, with `id` percent-encoded as
    /// one path segment.
    ///
    /// # Errors
    ///
    /// `Domain` if the URL cannot be built, `Transport` if the backend is unreachable, `UnexpectedStatus` on a
    /// non-2xx answer, `Decode` if the body is not a profile.
    pub async fn load_profile(&self, id: &str) -> ApplicationResult<UserProfile> {
        let url = join_url_segment(&self.api_url, "usuarios", id)?;
        let response = self.transport.send(ApiRequest::get(url)).await?;

        if !response.is_success() {
            return Err(ApplicationError::UnexpectedStatus {
                status: response.status,
                body: response.text(),
            });
        }
        response
            .json()
            .map_err(|e| ApplicationError::Decode(e.to_string()))
    }

    /// Like [`Self::load_profile`], but answers with the demo profile on any
    /// failure.
    pub async fn load_profile_or_placeholder(&self, id: &str) -> UserProfile {
        match self.load_profile(id).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(id, error = %e, "profile unavailable, showing placeholder");
                UserProfile::placeholder()
            }
        }
    }
}
