//! Access token claim decoding.
//!
//! The payload segment of the access token is decoded without verifying the
//! signature. Claims are only trusted for tokens received directly from the
//! configured token endpoint.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};

use super::types::AuthError;

/// Identity of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Subject identifier (`sub`).
    #[serde(rename = "sub")]
    pub subject_id: String,
    /// Email address.
    #[serde(default)]
    pub email: String,
    /// Whether the identity provider verified the email.
    #[serde(default)]
    pub email_verified: bool,
    /// Full display name (`name`).
    #[serde(default, rename = "name", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Given name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Family name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    /// Login name.
    #[serde(default)]
    pub preferred_username: String,
}

impl UserInfo {
    /// Best name to greet the user with.
    #[must_use]
    pub fn greeting_name(&self) -> &str {
        self.display_name
            .as_deref()
            .or(self.given_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.preferred_username)
    }
}

/// Decodes the user claims carried in a JWT access token.
///
/// # Errors
///
/// Returns `AuthError::InvalidTokenFormat` if the token does not have three
/// segments, the payload is not base64url, or the JSON lacks a `sub` claim.
pub fn decode_access_token(token: &str) -> Result<UserInfo, AuthError> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(AuthError::InvalidTokenFormat {
            message: "expected three dot-separated segments".to_string(),
        });
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| AuthError::InvalidTokenFormat {
            message: format!("payload is not base64url: {e}"),
        })?;

    serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidTokenFormat {
        message: format!("payload is not valid claims JSON: {e}"),
    })
}
