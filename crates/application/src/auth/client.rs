//! Session lifecycle against the identity provider.
//!
//! The auth client is the only writer of the token store and the session
//! state holder. Refreshes are single-flight: callers arriving while a refresh
//! is running wait for it and share its outcome.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use storefront_domain::auth::{REFRESH_LEAD_SECS, decode_access_token, is_expiring};
use storefront_domain::{AuthError, Credentials, SessionState, TokenSet, UserInfo};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use super::session_holder::{SessionStateHolder, SubscriptionId};
use super::token_store::{TokenStatus, TokenStore};
use crate::ports::{Clock, IdentityProvider, KeyValueStore, StorageError};

/// Outcome of the last completed refresh, tagged with its sequence number.
#[derive(Default)]
struct RefreshRound {
    generation: u64,
    outcome: Option<Result<TokenSet, AuthError>>,
}

/// Authentication client.
pub struct AuthClient<P, S, C> {
    provider: Arc<P>,
    tokens: TokenStore<S>,
    session: Arc<SessionStateHolder>,
    clock: C,
    refresh_lead_secs: i64,
    refresh_round: Mutex<RefreshRound>,
    completed_refreshes: AtomicU64,
    end_session_task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

fn storage_error(error: &StorageError) -> AuthError {
    AuthError::Storage {
        message: error.to_string(),
    }
}

impl<P, S, C> AuthClient<P, S, C>
where
    P: IdentityProvider + 'static,
    S: KeyValueStore,
    C: Clock,
{
    /// Creates a client writing to `storage` and `session`.
    #[must_use]
    pub fn new(provider: Arc<P>, storage: S, session: Arc<SessionStateHolder>, clock: C) -> Self {
        Self {
            provider,
            tokens: TokenStore::new(storage),
            session,
            clock,
            refresh_lead_secs: REFRESH_LEAD_SECS,
            refresh_round: Mutex::new(RefreshRound::default()),
            completed_refreshes: AtomicU64::new(0),
            end_session_task: parking_lot::Mutex::new(None),
        }
    }

    /// Overrides the "expiring soon" window (default five minutes).
    #[must_use]
    pub const fn with_refresh_lead(mut self, seconds: i64) -> Self {
        self.refresh_lead_secs = seconds;
        self
    }

    /// Shared session state holder.
    #[must_use]
    pub fn session(&self) -> &Arc<SessionStateHolder> {
        &self.session
    }

    /// Snapshot of the current session state.
    #[must_use]
    pub fn current_session(&self) -> SessionState {
        self.session.current()
    }

    /// Registers a session change listener.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&SessionState) + Send + Sync + 'static,
    {
        self.session.subscribe(listener)
    }

    /// Signs in with username and password.
    ///
    /// Nothing is stored unless the exchange succeeds and the returned access
    /// token decodes.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials`, `Network` or `Unclassified` from the exchange,
    /// `InvalidTokenFormat` if the access token cannot be decoded, `Storage`
    /// if the tokens cannot be saved.
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionState, AuthError> {
        let credentials = Credentials::new(username, password);
        let grant = self
            .provider
            .password_grant(&credentials)
            .await
            .inspect_err(|e| tracing::warn!(username, error = ?e, "login rejected"))?;

        let tokens = TokenSet::from_grant(grant, self.clock.now(), None)?;
        let user = decode_access_token(&tokens.access_token)?;
        self.tokens
            .save(&tokens)
            .await
            .map_err(|e| storage_error(&e))?;

        let state = SessionState::from_token_set(user, &tokens);
        self.session.set(state.clone());
        tracing::info!(
            subject = state.user.as_ref().map(|u| u.subject_id.as_str()),
            expires_at = %tokens.expires_at(),
            "signed in"
        );
        Ok(state)
    }

    /// Exchanges the stored refresh token for a new token set.
    ///
    /// # Errors
    ///
    /// `NoRefreshToken` when none is stored (no request is made). Any other
    /// failure signs the user out and returns `RefreshFailed`.
    pub async fn refresh(&self) -> Result<TokenSet, AuthError> {
        let observed = self.completed_refreshes.load(Ordering::Acquire);
        let mut round = self.refresh_round.lock().await;

        if round.generation != observed
            && let Some(outcome) = &round.outcome
        {
            tracing::debug!("joined an in-flight token refresh");
            return outcome.clone();
        }

        let outcome = self.refresh_once().await;
        round.generation += 1;
        round.outcome = Some(outcome.clone());
        self.completed_refreshes
            .store(round.generation, Ordering::Release);
        outcome
    }

    async fn refresh_once(&self) -> Result<TokenSet, AuthError> {
        let refresh_token = match self.tokens.refresh_token().await {
            Ok(Some(token)) => token,
            Ok(None) => return Err(AuthError::NoRefreshToken),
            Err(e) => {
                tracing::warn!(error = %e, "could not read refresh token, signing out");
                self.logout().await;
                return Err(AuthError::RefreshFailed {
                    message: storage_error(&e).to_string(),
                });
            }
        };

        match self.exchange_refresh_token(&refresh_token).await {
            Ok(tokens) => {
                tracing::info!(expires_at = %tokens.expires_at(), "access token refreshed");
                Ok(tokens)
            }
            Err(error) => {
                tracing::warn!(error = ?error, "token refresh failed, signing out");
                self.logout().await;
                Err(match error {
                    AuthError::RefreshFailed { .. } => error,
                    other => AuthError::RefreshFailed {
                        message: other.to_string(),
                    },
                })
            }
        }
    }

    async fn exchange_refresh_token(&self, refresh_token: &str) -> Result<TokenSet, AuthError> {
        let grant = self.provider.refresh_grant(refresh_token).await?;
        let tokens = TokenSet::from_grant(grant, self.clock.now(), Some(refresh_token))?;
        let user = decode_access_token(&tokens.access_token)?;
        self.tokens
            .save(&tokens)
            .await
            .map_err(|e| storage_error(&e))?;
        self.session
            .set(SessionState::from_token_set(user, &tokens));
        Ok(tokens)
    }

    /// Fetches the user-info document with the current access token.
    ///
    /// # Errors
    ///
    /// `NoToken` if signed out, `Storage` if the store cannot be read,
    /// otherwise whatever the provider reports.
    pub async fn fetch_user_info(&self) -> Result<UserInfo, AuthError> {
        let token = self
            .tokens
            .access_token()
            .await
            .map_err(|e| storage_error(&e))?
            .ok_or(AuthError::NoToken)?;

        let info = self.provider.user_info(&token).await?;
        let refresh_token = self
            .tokens
            .refresh_token()
            .await
            .map_err(|e| storage_error(&e))?;
        self.session
            .set(SessionState::signed_in(info.clone(), token, refresh_token));
        Ok(info)
    }

    /// Clears stored tokens and resets the session.
    ///
    /// The identity provider is told to end its session in a background
    /// task; this call does not wait for it.
    pub async fn logout(&self) {
        let refresh_token = self.tokens.refresh_token().await.ok().flatten();

        if let Err(e) = self.tokens.clear().await {
            tracing::error!(error = %e, "failed to clear stored tokens");
        }
        self.session.reset();
        tracing::info!("signed out");

        if let Some(refresh_token) = refresh_token {
            self.notify_end_session(refresh_token);
        }
    }

    fn notify_end_session(&self, refresh_token: String) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::debug!("no async runtime, skipping identity provider logout");
            return;
        };
        let provider = Arc::clone(&self.provider);
        let task = runtime.spawn(async move {
            if let Err(e) = provider.end_session(&refresh_token).await {
                tracing::debug!(error = ?e, "identity provider logout failed");
            }
        });
        *self.end_session_task.lock() = Some(task);
    }

    /// Waits for the identity provider notification started by the last
    /// [`Self::logout`], if any. Short-lived callers use this before exiting.
    pub async fn wait_for_end_session(&self) {
        let task = self.end_session_task.lock().take();
        if let Some(task) = task
            && let Err(e) = task.await
        {
            tracing::debug!(error = %e, "identity provider logout task did not finish");
        }
    }

    /// Rebuilds the session from stored tokens. Run once at startup.
    ///
    /// A live token is decoded directly; an expired or incomplete one gets a
    /// single refresh attempt. Every failure ends signed out.
    pub async fn restore_session(&self) -> SessionState {
        let persisted = match self.tokens.load().await {
            Ok(persisted) => persisted,
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored session");
                return self.session.current();
            }
        };

        if persisted.is_empty() {
            self.session.reset();
            return self.session.current();
        }

        let now = self.clock.now();
        if let (Some(access), Some(expiry)) = (&persisted.access_token, persisted.expires_at)
            && now < expiry
        {
            match decode_access_token(access) {
                Ok(user) => {
                    self.session.set(SessionState::signed_in(
                        user,
                        access.clone(),
                        persisted.refresh_token.clone(),
                    ));
                    tracing::info!(expires_at = %expiry, "session restored");
                }
                Err(e) => {
                    tracing::warn!(error = ?e, "stored access token is unreadable");
                    self.logout().await;
                }
            }
            return self.session.current();
        }

        if let Err(e) = self.refresh().await {
            tracing::info!(error = ?e, "stored session could not be renewed");
            self.logout().await;
        }
        self.session.current()
    }

    /// True if no expiry is known or it is within the refresh lead window.
    pub async fn is_expiring_soon(&self) -> bool {
        let expiry = self.tokens.expires_at().await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "could not read token expiry");
            None
        });
        is_expiring(expiry, self.clock.now(), self.refresh_lead_secs)
    }

    /// Stored access token, if any.
    pub async fn access_token(&self) -> Option<String> {
        self.tokens.access_token().await.ok().flatten()
    }

    /// Status of the stored token.
    ///
    /// # Errors
    ///
    /// `Storage` if the store cannot be read.
    pub async fn token_status(&self) -> Result<TokenStatus, AuthError> {
        self.tokens
            .status(self.clock.now(), self.refresh_lead_secs)
            .await
            .map_err(|e| storage_error(&e))
    }
}
