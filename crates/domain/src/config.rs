//! Environment configuration
//!
//! Mirrors the per-environment settings of the storefront front end: backend
//! base URL, identity provider realm, catalog URL and debug switch.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DomainError, DomainResult};

/// Identity provider (Keycloak realm) settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeycloakConfig {
    /// Base URL of the identity provider.
    pub url: String,
    /// Realm name.
    pub realm: String,
    /// Public client identifier.
    pub client_id: String,
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8080".to_string(),
            realm: "ecommerce".to_string(),
            client_id: "frontend-client".to_string(),
        }
    }
}

impl KeycloakConfig {
    /// Base of the realm's OpenID Connect endpoints.
    #[must_use]
    pub fn openid_base(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect",
            self.url.trim_end_matches('/'),
            self.realm
        )
    }

    /// Token endpoint.
    #[must_use]
    pub fn token_endpoint(&self) -> String {
        format!("{}/token", self.openid_base())
    }

    /// User-info endpoint.
    #[must_use]
    pub fn userinfo_endpoint(&self) -> String {
        format!("{}/userinfo", self.openid_base())
    }

    /// End-session endpoint.
    #[must_use]
    pub fn logout_endpoint(&self) -> String {
        format!("{}/logout", self.openid_base())
    }
}

/// Application configuration for one deployment environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Production build flag.
    pub production: bool,
    /// Backend API base URL.
    pub api_url: String,
    /// Display name.
    pub app_name: String,
    /// Verbose logging.
    pub enable_debug: bool,
    /// Application version.
    pub version: String,
    /// Identity provider.
    pub keycloak: KeycloakConfig,
    /// Catalog front end to redirect to after login.
    pub catalog_url: String,
    /// Directory for persisted session data. Platform data dir when unset.
    pub storage_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            production: false,
            api_url: "http://localhost:8080/api".to_string(),
            app_name: "Storefront - Dev".to_string(),
            enable_debug: true,
            version: "1.0.0".to_string(),
            keycloak: KeycloakConfig::default(),
            catalog_url: "http://localhost:4201".to_string(),
            storage_dir: None,
        }
    }
}

/// Joins `path` onto `base` with exactly one slash between them.
#[must_use]
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Joins `path` onto `base`, then appends `segment` percent-encoded as a
/// single path segment.
///
/// # Errors
///
/// Returns `DomainError::InvalidUrl` if the joined URL does not parse or
/// cannot carry path segments.
pub fn join_url_segment(base: &str, path: &str, segment: &str) -> DomainResult<String> {
    let joined = join_url(base, path);
    let mut url =
        Url::parse(&joined).map_err(|e| DomainError::InvalidUrl(format!("{e}: {joined}")))?;
    url.path_segments_mut()
        .map_err(|()| DomainError::InvalidUrl(joined.clone()))?
        .pop_if_empty()
        .push(segment);
    Ok(url.into())
}

impl AppConfig {
    /// Joins `path` onto the API base URL with exactly one slash.
    #[must_use]
    pub fn api_endpoint(&self, path: &str) -> String {
        join_url(&self.api_url, path)
    }

    /// Checks that every URL setting parses.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> DomainResult<()> {
        for (field, value) in [
            ("api_url", &self.api_url),
            ("keycloak.url", &self.keycloak.url),
            ("catalog_url", &self.catalog_url),
        ] {
            Url::parse(value)
                .map_err(|e| DomainError::InvalidConfig(format!("{field}: {e}")))?;
        }
        if self.keycloak.realm.is_empty() || self.keycloak.client_id.is_empty() {
            return Err(DomainError::InvalidConfig(
                "keycloak.realm and keycloak.client_id must be set".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_keycloak_endpoints() {
        let keycloak = KeycloakConfig {
            url: "https://auth.shop.test/".to_string(),
            ..KeycloakConfig::default()
        };
        assert_eq!(
            keycloak.token_endpoint(),
            "https://auth.shop.test/realms/ecommerce/protocol/openid-connect/token"
        );
        assert!(keycloak.userinfo_endpoint().ends_with("/openid-connect/userinfo"));
        assert!(keycloak.logout_endpoint().ends_with("/openid-connect/logout"));
    }

    #[test]
    fn test_api_endpoint_single_slash() {
        let config = AppConfig::default();
        assert_eq!(config.api_endpoint("/usuarios/1"), "http://localhost:8080/api/usuarios/1");
        assert_eq!(config.api_endpoint("usuarios/1"), "http://localhost:8080/api/usuarios/1");
    }

    #[test]
    fn test_segment_is_percent_encoded() {
        assert_eq!(
            join_url_segment("http://api.test/api/", "usuarios", "7").unwrap(),
            "http://api.test/api/usuarios/7"
        );
        assert_eq!(
            join_url_segment("http://api.test/api", "usuarios/", "../admin?x=1#y").unwrap(),
            "http://api.test/api/usuarios/..%2Fadmin%3Fx=1%23y"
        );
        assert!(join_url_segment("not a url", "usuarios", "7").is_err());
    }

    #[test]
    fn test_validate() {
        assert!(AppConfig::default().validate().is_ok());
        let broken = AppConfig {
            catalog_url: "catalog".to_string(),
            ..AppConfig::default()
        };
        assert!(matches!(broken.validate(), Err(DomainError::InvalidConfig(m)) if m.starts_with("catalog_url")));
    }
}
