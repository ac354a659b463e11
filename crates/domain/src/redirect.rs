//! Where to send the user after a successful login.

use std::collections::BTreeMap;
use std::fmt;

use url::{Url, form_urlencoded};

use crate::auth::SessionState;
use crate::error::{DomainError, DomainResult};

/// Post-login destination carrying the session tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginRedirect {
    /// Another application, tokens passed as query parameters.
    External(Url),
    /// A route inside this application, tokens passed as route parameters.
    Internal {
        /// Route path, e.g. `/profile`.
        route: String,
        /// `access_token` and `refresh_token`.
        params: BTreeMap<String, String>,
    },
}

impl LoginRedirect {
    /// Builds a redirect to an external application such as the catalog.
    ///
    /// Existing query parameters on `target` are kept.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` if `target` does not parse and
    /// `DomainError::MissingTokens` if the session has no tokens.
    pub fn external(target: &str, session: &SessionState) -> DomainResult<Self> {
        let params = token_params(session)?;
        let mut url =
            Url::parse(target).map_err(|e| DomainError::InvalidUrl(format!("{e}: {target}")))?;
        url.query_pairs_mut().extend_pairs(params.iter());
        Ok(Self::External(url))
    }

    /// Builds a navigation to an internal route.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::MissingTokens` if the session has no tokens.
    pub fn internal(route: impl Into<String>, session: &SessionState) -> DomainResult<Self> {
        Ok(Self::Internal {
            route: route.into(),
            params: token_params(session)?,
        })
    }
}

impl fmt::Display for LoginRedirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::External(url) => write!(f, "{url}"),
            Self::Internal { route, params } => {
                let query = form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(params.iter())
                    .finish();
                write!(f, "{route}?{query}")
            }
        }
    }
}

fn token_params(session: &SessionState) -> DomainResult<BTreeMap<String, String>> {
    let (Some(access), Some(refresh)) = (&session.token, &session.refresh_token) else {
        return Err(DomainError::MissingTokens);
    };
    Ok(BTreeMap::from([
        ("access_token".to_string(), access.clone()),
        ("refresh_token".to_string(), refresh.clone()),
    ]))
}
