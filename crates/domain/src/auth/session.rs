//! Session state snapshot

use serde::{Deserialize, Serialize};

use super::claims::UserInfo;
use super::types::TokenSet;

/// Observable view of the current authentication session.
///
/// `authenticated` is true only when a token is present and its claims were
/// decoded into `user`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    /// Whether a decoded, usable token is present.
    pub authenticated: bool,
    /// The signed-in user.
    pub user: Option<UserInfo>,
    /// Current access token.
    pub token: Option<String>,
    /// Current refresh token.
    pub refresh_token: Option<String>,
}

impl SessionState {
    /// The unauthenticated default.
    #[must_use]
    pub fn signed_out() -> Self {
        Self::default()
    }

    /// Builds an authenticated state from decoded claims and raw tokens.
    #[must_use]
    pub fn signed_in(user: UserInfo, token: String, refresh_token: Option<String>) -> Self {
        Self {
            authenticated: true,
            user: Some(user),
            token: Some(token),
            refresh_token,
        }
    }

    /// Builds an authenticated state from a token set.
    #[must_use]
    pub fn from_token_set(user: UserInfo, tokens: &TokenSet) -> Self {
        Self::signed_in(
            user,
            tokens.access_token.clone(),
            Some(tokens.refresh_token.clone()),
        )
    }
}
