//! Persistent token storage with expiry tracking.
//!
//! Tokens live in a [`KeyValueStore`] under three keys: `access_token`,
//! `refresh_token` and `token_expiry` (epoch milliseconds as a decimal
//! string).

use chrono::{DateTime, TimeZone, Utc};
use storefront_domain::TokenSet;
use storefront_domain::auth::is_expiring;

use crate::ports::{KeyValueStore, StorageError};

/// Storage key of the access token.
pub const ACCESS_TOKEN_KEY: &str = "access_token";
/// Storage key of the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refresh_token";
/// Storage key of the expiry timestamp.
pub const TOKEN_EXPIRY_KEY: &str = "token_expiry";

const ALL_KEYS: [&str; 3] = [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, TOKEN_EXPIRY_KEY];

/// Token state as read back from storage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedTokens {
    /// Stored access token.
    pub access_token: Option<String>,
    /// Stored refresh token.
    pub refresh_token: Option<String>,
    /// Stored expiry, `None` if missing or unparseable.
    pub expires_at: Option<DateTime<Utc>>,
}

impl PersistedTokens {
    /// True when nothing is stored.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.access_token.is_none() && self.refresh_token.is_none()
    }
}

/// Token store on top of durable key-value storage.
#[derive(Debug, Clone)]
pub struct TokenStore<S> {
    storage: S,
}

impl<S: KeyValueStore> TokenStore<S> {
    /// Creates a token store over the given storage.
    #[must_use]
    pub const fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Writes all three keys in one batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub async fn save(&self, tokens: &TokenSet) -> Result<(), StorageError> {
        self.storage
            .set_many(&[
                (ACCESS_TOKEN_KEY, tokens.access_token.clone()),
                (REFRESH_TOKEN_KEY, tokens.refresh_token.clone()),
                (TOKEN_EXPIRY_KEY, tokens.expiry_timestamp_ms().to_string()),
            ])
            .await
    }

    /// Reads everything that is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub async fn load(&self) -> Result<PersistedTokens, StorageError> {
        Ok(PersistedTokens {
            access_token: self.access_token().await?,
            refresh_token: self.refresh_token().await?,
            expires_at: self.expires_at().await?,
        })
    }

    /// Stored access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub async fn access_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(ACCESS_TOKEN_KEY).await
    }

    /// Stored refresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub async fn refresh_token(&self) -> Result<Option<String>, StorageError> {
        self.storage.get(REFRESH_TOKEN_KEY).await
    }

    /// Stored expiry. An unparseable value reads as `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub async fn expires_at(&self) -> Result<Option<DateTime<Utc>>, StorageError> {
        let raw = self.storage.get(TOKEN_EXPIRY_KEY).await?;
        Ok(raw
            .and_then(|value| value.trim().parse::<i64>().ok())
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single()))
    }

    /// Removes all token keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove_many(&ALL_KEYS).await
    }

    /// Token status for display.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub async fn status(
        &self,
        now: DateTime<Utc>,
        lead_secs: i64,
    ) -> Result<TokenStatus, StorageError> {
        let persisted = self.load().await?;
        Ok(TokenStatus::evaluate(&persisted, now, lead_secs))
    }
}

/// Status of the stored token for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStatus {
    /// No token is stored.
    NotAuthenticated,
    /// Token is valid and not expiring soon.
    Valid {
        /// Seconds until expiry.
        seconds_remaining: i64,
    },
    /// Token is valid but inside the refresh lead window.
    Expiring {
        /// Seconds until expiry.
        seconds_remaining: i64,
        /// Whether a refresh token is stored.
        can_refresh: bool,
    },
    /// Token has expired, or its expiry is unknown.
    Expired {
        /// Whether a refresh token is stored.
        can_refresh: bool,
    },
}

impl TokenStatus {
    fn evaluate(persisted: &PersistedTokens, now: DateTime<Utc>, lead_secs: i64) -> Self {
        if persisted.access_token.is_none() {
            return Self::NotAuthenticated;
        }
        let can_refresh = persisted.refresh_token.is_some();
        match persisted.expires_at {
            Some(expiry) if now < expiry => {
                let seconds_remaining = (expiry - now).num_seconds();
                if is_expiring(Some(expiry), now, lead_secs) {
                    Self::Expiring {
                        seconds_remaining,
                        can_refresh,
                    }
                } else {
                    Self::Valid { seconds_remaining }
                }
            }
            _ => Self::Expired { can_refresh },
        }
    }

    /// Returns true if the token can still be used.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. } | Self::Expiring { .. })
    }

    /// Get a user-friendly display message.
    #[must_use]
    pub fn display_message(&self) -> String {
        match self {
            Self::NotAuthenticated => "Not signed in".to_string(),
            Self::Valid { seconds_remaining } => {
                if *seconds_remaining > 3600 {
                    format!("Valid for {} hours", seconds_remaining / 3600)
                } else if *seconds_remaining > 60 {
                    format!("Valid for {} minutes", seconds_remaining / 60)
                } else {
                    format!("Valid for {seconds_remaining} seconds")
                }
            }
            Self::Expiring {
                seconds_remaining,
                can_refresh,
            } => {
                let refresh_hint = if *can_refresh {
                    " (will auto-refresh)"
                } else {
                    ""
                };
                format!("Expiring in {seconds_remaining} seconds{refresh_hint}")
            }
            Self::Expired { can_refresh: true } => "Expired (can refresh)".to_string(),
            Self::Expired { can_refresh: false } => "Expired".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::test_support::MemoryStore;
    use chrono::Duration;
    use pretty_assertions::assert_eq;

    fn token_set(issued_at: DateTime<Utc>, expires_in_secs: u64) -> TokenSet {
        TokenSet {
            access_token: "access123".to_string(),
            refresh_token: "refresh456".to_string(),
            issued_at,
            expires_in_secs,
        }
    }

    #[tokio::test]
    async fn test_save_writes_three_keys() {
        let storage = MemoryStore::default();
        let store = TokenStore::new(storage.clone());
        let issued = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();

        store.save(&token_set(issued, 60)).await.unwrap();

        assert_eq!(storage.value(ACCESS_TOKEN_KEY).as_deref(), Some("access123"));
        assert_eq!(storage.value(REFRESH_TOKEN_KEY).as_deref(), Some("refresh456"));
        assert_eq!(storage.value(TOKEN_EXPIRY_KEY).as_deref(), Some("1700000060000"));
    }

    #[tokio::test]
    async fn test_load_round_trips_expiry() {
        let store = TokenStore::new(MemoryStore::default());
        let issued = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        store.save(&token_set(issued, 300)).await.unwrap();

        let persisted = store.load().await.unwrap();
        assert_eq!(persisted.expires_at, Some(issued + Duration::seconds(300)));
        assert!(!persisted.is_empty());
    }

    #[tokio::test]
    async fn test_garbage_expiry_reads_as_unknown() {
        let storage = MemoryStore::default();
        storage.insert(TOKEN_EXPIRY_KEY, "tomorrow");
        let store = TokenStore::new(storage);
        assert_eq!(store.expires_at().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_removes_all_keys() {
        let storage = MemoryStore::default();
        let store = TokenStore::new(storage.clone());
        store.save(&token_set(Utc::now(), 60)).await.unwrap();
        storage.insert("unrelated", "kept");

        store.clear().await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(storage.value(TOKEN_EXPIRY_KEY), None);
        assert_eq!(storage.value("unrelated").as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn test_status_transitions() {
        let store = TokenStore::new(MemoryStore::default());
        let issued = Utc::now();
        assert_eq!(
            store.status(issued, 300).await.unwrap(),
            TokenStatus::NotAuthenticated
        );

        store.save(&token_set(issued, 3600)).await.unwrap();
        let status = store.status(issued, 300).await.unwrap();
        assert!(matches!(status, TokenStatus::Valid { .. }));

        let status = store
            .status(issued + Duration::seconds(3400), 300)
            .await
            .unwrap();
        assert_eq!(
            status,
            TokenStatus::Expiring {
                seconds_remaining: 200,
                can_refresh: true
            }
        );

        let status = store
            .status(issued + Duration::seconds(3600), 300)
            .await
            .unwrap();
        assert_eq!(status, TokenStatus::Expired { can_refresh: true });
        assert!(!status.is_valid());
    }

    #[test]
    fn test_token_status_display_messages() {
        assert_eq!(TokenStatus::NotAuthenticated.display_message(), "Not signed in");
        assert!(
            TokenStatus::Valid {
                seconds_remaining: 7200
            }
            .display_message()
            .contains("hours")
        );
        assert!(
            TokenStatus::Expiring {
                seconds_remaining: 30,
                can_refresh: true
            }
            .display_message()
            .contains("auto-refresh")
        );
    }
}
