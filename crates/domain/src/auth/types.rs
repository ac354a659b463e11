//! Token and credential types

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// How long before expiry a token counts as "expiring soon".
pub const REFRESH_LEAD_SECS: i64 = 5 * 60;

/// Username and password for a single password-grant exchange.
///
/// Never persisted. The `Debug` impl redacts the password.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name or email.
    pub username: String,
    /// Plain-text password.
    pub password: String,
}

impl Credentials {
    /// Creates a new credentials pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Raw response body of the identity provider's token endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token, absent for some grant configurations.
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Access token lifetime in seconds.
    pub expires_in: u64,
    /// Token type, normally `Bearer`.
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Space-separated granted scopes.
    #[serde(default)]
    pub scope: Option<String>,
    /// Identity provider session identifier.
    #[serde(default)]
    pub session_state: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Access and refresh token pair with expiry tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    /// Bearer access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// When the token endpoint issued this set.
    pub issued_at: DateTime<Utc>,
    /// Access token lifetime in seconds.
    pub expires_in_secs: u64,
}

impl TokenSet {
    /// Builds a token set from a token endpoint response.
    ///
    /// Refresh responses may omit `refresh_token`; `previous_refresh` is kept
    /// in that case so both tokens stay present together.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unclassified` if the grant carries no refresh token
    /// and there is no previous one to keep.
    pub fn from_grant(
        grant: TokenGrant,
        issued_at: DateTime<Utc>,
        previous_refresh: Option<&str>,
    ) -> Result<Self, AuthError> {
        let refresh_token = grant
            .refresh_token
            .or_else(|| previous_refresh.map(str::to_string))
            .ok_or_else(|| AuthError::Unclassified {
                status: 200,
                message: "token response did not include a refresh token".to_string(),
            })?;

        Ok(Self {
            access_token: grant.access_token,
            refresh_token,
            issued_at,
            expires_in_secs: grant.expires_in,
        })
    }

    /// Absolute expiry instant.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        i64::try_from(self.expires_in_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .and_then(|lifetime| self.issued_at.checked_add_signed(lifetime))
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Expiry as epoch milliseconds (`issued_at + expires_in * 1000`).
    #[must_use]
    pub fn expiry_timestamp_ms(&self) -> i64 {
        self.expires_at().timestamp_millis()
    }

    /// Returns the Authorization header value.
    #[must_use]
    pub fn authorization_header(&self) -> String {
        bearer(&self.access_token)
    }
}

/// Formats a bearer credential header value.
#[must_use]
pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

/// Returns true when there is no known expiry, or `now` is within
/// `lead_secs` of it.
#[must_use]
pub fn is_expiring(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>, lead_secs: i64) -> bool {
    expires_at.is_none_or(|expiry| {
        let threshold = Duration::try_seconds(lead_secs)
            .and_then(|lead| expiry.checked_sub_signed(lead))
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        now >= threshold
    })
}

/// Authentication errors.
///
/// The `Display` text is suitable for showing to the end user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// Username or password rejected by the identity provider.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A refresh was requested but no refresh token is stored.
    #[error("No refresh token available")]
    NoRefreshToken,

    /// An authenticated call was requested but no access token is stored.
    #[error("No access token available")]
    NoToken,

    /// The identity provider rejected the refresh grant.
    #[error("Your session has expired, please sign in again ({message})")]
    RefreshFailed {
        /// Error description.
        message: String,
    },

    /// The access token payload could not be decoded.
    #[error("Received a malformed access token: {message}")]
    InvalidTokenFormat {
        /// Error description.
        message: String,
    },

    /// Transport-level failure, no HTTP status was received.
    #[error("Could not reach the server, check your connection")]
    Network {
        /// Error description.
        message: String,
    },

    /// Saved session data could not be read or written.
    #[error("Could not access saved session data: {message}")]
    Storage {
        /// Error description.
        message: String,
    },

    /// Any other failure.
    #[error("Sign-in failed, please try again later")]
    Unclassified {
        /// HTTP status code, if one was received.
        status: u16,
        /// Error description.
        message: String,
    },
}

impl AuthError {
    /// Classifies a failed credential exchange by HTTP status.
    ///
    /// Status `0` stands for "no response".
    #[must_use]
    pub fn from_login_status(status: u16, message: impl Into<String>) -> Self {
        match status {
            0 => Self::Network {
                message: message.into(),
            },
            400 | 401 => Self::InvalidCredentials,
            _ => Self::Unclassified {
                status,
                message: message.into(),
            },
        }
    }
}
