//! Keycloak identity provider adapter.
//!
//! Talks to a realm's OpenID Connect endpoints: password and refresh-token
//! grants on the token endpoint, the user-info endpoint and the end-session
//! (logout) endpoint.

use serde::Deserialize;
use storefront_application::IdentityProvider;
use storefront_domain::auth::bearer;
use storefront_domain::{AuthError, Credentials, KeycloakConfig, TokenGrant, UserInfo};

/// Content-Type for form-urlencoded data.
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `OAuth2` error response.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Best description of a failed response body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<TokenErrorResponse>(body).map_or_else(
        |_| body.to_string(),
        |e| e.error_description.unwrap_or(e.error),
    )
}

fn network(error: &reqwest::Error) -> AuthError {
    AuthError::Network {
        message: error.to_string(),
    }
}

/// Identity provider backed by a Keycloak realm.
#[derive(Debug, Clone)]
pub struct KeycloakProvider {
    http_client: reqwest::Client,
    client_id: String,
    token_url: String,
    userinfo_url: String,
    logout_url: String,
}

impl KeycloakProvider {
    /// Creates a provider for the configured realm.
    #[must_use]
    pub fn new(config: &KeycloakConfig) -> Self {
        Self::with_client(
            config,
            reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        )
    }

    /// Creates a provider sharing an existing HTTP client.
    #[must_use]
    pub fn with_client(config: &KeycloakConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            client_id: config.client_id.clone(),
            token_url: config.token_endpoint(),
            userinfo_url: config.userinfo_endpoint(),
            logout_url: config.logout_endpoint(),
        }
    }

    /// Posts a form to `url`, returning status and body text.
    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<(reqwest::StatusCode, String), AuthError> {
        let body = serde_urlencoded::to_string(params).map_err(|e| AuthError::Unclassified {
            status: 0,
            message: format!("Failed to encode form: {e}"),
        })?;

        let response = self
            .http_client
            .post(url)
            .header("Content-Type", FORM_CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| network(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| network(&e))?;
        Ok((status, text))
    }

    fn parse_grant(status: reqwest::StatusCode, body: &str) -> Result<TokenGrant, AuthError> {
        serde_json::from_str(body).map_err(|e| AuthError::Unclassified {
            status: status.as_u16(),
            message: format!("Failed to parse token response: {e}"),
        })
    }
}

impl IdentityProvider for KeycloakProvider {
    async fn password_grant(&self, credentials: &Credentials) -> Result<TokenGrant, AuthError> {
        let (status, body) = self
            .post_form(
                &self.token_url,
                &[
                    ("grant_type", "password"),
                    ("client_id", &self.client_id),
                    ("username", &credentials.username),
                    ("password", &credentials.password),
                ],
            )
            .await?;

        if !status.is_success() {
            return Err(AuthError::from_login_status(
                status.as_u16(),
                error_message(&body),
            ));
        }
        Self::parse_grant(status, &body)
    }

    async fn refresh_grant(&self, refresh_token: &str) -> Result<TokenGrant, AuthError> {
        let (status, body) = self
            .post_form(
                &self.token_url,
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", &self.client_id),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        if !status.is_success() {
            return Err(AuthError::RefreshFailed {
                message: error_message(&body),
            });
        }
        Self::parse_grant(status, &body)
    }

    async fn user_info(&self, access_token: &str) -> Result<UserInfo, AuthError> {
        let response = self
            .http_client
            .get(&self.userinfo_url)
            .header("Authorization", bearer(access_token))
            .send()
            .await
            .map_err(|e| network(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| network(&e))?;
        if !status.is_success() {
            return Err(AuthError::Unclassified {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        serde_json::from_str(&body).map_err(|e| AuthError::Unclassified {
            status: status.as_u16(),
            message: format!("Failed to parse user info: {e}"),
        })
    }

    async fn end_session(&self, refresh_token: &str) -> Result<(), AuthError> {
        let (status, body) = self
            .post_form(
                &self.logout_url,
                &[
                    ("client_id", &self.client_id),
                    ("refresh_token", refresh_token),
                ],
            )
            .await?;

        if status.is_success() {
            Ok(())
        } else {
            Err(AuthError::Unclassified {
                status: status.as_u16(),
                message: error_message(&body),
            })
        }
    }
}
