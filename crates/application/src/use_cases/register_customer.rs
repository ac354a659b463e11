//! Customer registration use case.

use storefront_domain::config::join_url;
use storefront_domain::{ApiRequest, ApiResponse, RegistrationForm};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::HttpTransport;

/// Submits completed registration forms to the backend.
pub struct RegistrationService<T> {
    transport: T,
    api_url: String,
}

impl<T: HttpTransport> RegistrationService<T> {
    /// Creates the service against the backend at `api_url`.
    pub fn new(transport: T, api_url: impl Into<String>) -> Self {
        Self {
            transport,
            api_url: api_url.into(),
        }
    }

    /// Validates every step and posts the form to `{api_url}/auth/register`.
    ///
    /// Nothing is sent if validation fails.
    ///
    /// # Errors
    ///
    /// `Validation` with every issue found, `Transport` if the backend is
    /// unreachable, `UnexpectedStatus` on a non-2xx answer.
    pub async fn register(&self, form: &RegistrationForm) -> ApplicationResult<ApiResponse> {
        let issues = form.validate();
        if !issues.is_empty() {
            return Err(ApplicationError::Validation(issues));
        }

        let body = serde_json::to_string(&form.to_request())
            .map_err(|e| ApplicationError::Decode(e.to_string()))?;
        let url = join_url(&self.api_url, "auth/register");
        let response = self
            .transport
            .send(ApiRequest::post_json(url, body))
            .await?;

        if !response.is_success() {
            return Err(ApplicationError::UnexpectedStatus {
                status: response.status,
                body: response.text(),
            });
        }
        tracing::info!(email = %form.email, "customer registered");
        Ok(response)
    }
}
