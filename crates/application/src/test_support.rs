//! In-memory fakes for the ports, shared by unit tests.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use storefront_domain::{ApiRequest, ApiResponse, AuthError, Credentials, TokenGrant, UserInfo};

use crate::ports::{Clock, HttpTransport, IdentityProvider, KeyValueStore, StorageError, TransportError};

/// Password accepted by [`FakeProvider`].
pub const GOOD_PASSWORD: &str = "correct-horse";

/// Builds an unsigned JWT carrying `claims`.
pub fn jwt_with(claims: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.signature")
}

/// Builds an unsigned JWT for a subject and email.
pub fn jwt_for(subject: &str, email: &str) -> String {
    jwt_with(&serde_json::json!({
        "sub": subject,
        "email": email,
        "email_verified": true,
        "name": "Ana Ruiz",
        "given_name": "Ana",
        "family_name": "Ruiz",
        "preferred_username": "ana",
    }))
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
    reads_fail: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries.lock().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.entries.lock().insert(key.to_string(), value.to_string());
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Makes every later `get` fail; writes and removals still work.
    pub fn fail_reads(&self) {
        self.reads_fail.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        if self.reads_fail.load(Ordering::SeqCst) {
            return Err(StorageError::Serialization("unreadable store".to_string()));
        }
        Ok(self.value(key))
    }

    async fn set_many(&self, entries: &[(&str, String)]) -> Result<(), StorageError> {
        let mut map = self.entries.lock();
        for (key, value) in entries {
            map.insert((*key).to_string(), value.clone());
        }
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        let mut map = self.entries.lock();
        for key in keys {
            map.remove(*key);
        }
        Ok(())
    }
}

/// Clock that only moves when told to.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        let start = Utc.timestamp_millis_opt(1_750_000_000_000).unwrap();
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }
}

impl ManualClock {
    pub fn advance(&self, by: Duration) {
        *self.now.lock() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

struct ProviderSettings {
    access_token: Option<String>,
    expires_in: u64,
    refresh_error: Option<AuthError>,
    refresh_delay: Option<StdDuration>,
}

/// Identity provider double with call counters.
pub struct FakeProvider {
    settings: Mutex<ProviderSettings>,
    issued: AtomicUsize,
    password_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    end_session_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(ProviderSettings {
                access_token: None,
                expires_in: 3600,
                refresh_error: None,
                refresh_delay: None,
            }),
            issued: AtomicUsize::new(0),
            password_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            end_session_calls: AtomicUsize::new(0),
        }
    }

    /// Issue this literal access token instead of a fresh JWT.
    pub fn set_access_token(&self, token: &str) {
        self.settings.lock().access_token = Some(token.to_string());
    }

    pub fn set_expires_in(&self, seconds: u64) {
        self.settings.lock().expires_in = seconds;
    }

    pub fn reject_refresh(&self) {
        self.fail_refresh(AuthError::RefreshFailed {
            message: "invalid_grant".to_string(),
        });
    }

    /// Answer refresh grants with `error`.
    pub fn fail_refresh(&self, error: AuthError) {
        self.settings.lock().refresh_error = Some(error);
    }

    pub fn delay_refresh(&self, delay: StdDuration) {
        self.settings.lock().refresh_delay = Some(delay);
    }

    pub fn password_calls(&self) -> usize {
        self.password_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn end_session_calls(&self) -> usize {
        self.end_session_calls.load(Ordering::SeqCst)
    }

    fn grant(&self) -> TokenGrant {
        let serial = self.issued.fetch_add(1, Ordering::SeqCst);
        let settings = self.settings.lock();
        let access_token = settings.access_token.clone().unwrap_or_else(|| {
            jwt_with(&serde_json::json!({
                "sub": "user-1",
                "email": "ana@shop.test",
                "email_verified": true,
                "name": "Ana Ruiz",
                "preferred_username": "ana",
                "jti": serial,
            }))
        });
        TokenGrant {
            access_token,
            refresh_token: Some(format!("refresh-{serial}")),
            expires_in: settings.expires_in,
            token_type: "Bearer".to_string(),
            scope: Some("openid email profile".to_string()),
            session_state: Some("session-1".to_string()),
        }
    }
}

impl IdentityProvider for FakeProvider {
    async fn password_grant(&self, credentials: &Credentials) -> Result<TokenGrant, AuthError> {
        self.password_calls.fetch_add(1, Ordering::SeqCst);
        if credentials.password == GOOD_PASSWORD {
            Ok(self.grant())
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }

    async fn refresh_grant(&self, _refresh_token: &str) -> Result<TokenGrant, AuthError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);
        let (error, delay) = {
            let settings = self.settings.lock();
            (settings.refresh_error.clone(), settings.refresh_delay)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = error {
            return Err(error);
        }
        Ok(self.grant())
    }

    async fn user_info(&self, _access_token: &str) -> Result<UserInfo, AuthError> {
        Ok(UserInfo {
            subject_id: "user-1".to_string(),
            email: "ana@shop.test".to_string(),
            email_verified: true,
            display_name: Some("Ana Ruiz (userinfo)".to_string()),
            given_name: Some("Ana".to_string()),
            family_name: Some("Ruiz".to_string()),
            preferred_username: "ana".to_string(),
        })
    }

    async fn end_session(&self, _refresh_token: &str) -> Result<(), AuthError> {
        self.end_session_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Transport that records requests and replays queued responses.
///
/// Answers `200 {}` once the queue is empty.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    requests: Arc<Mutex<Vec<ApiRequest>>>,
    responses: Arc<Mutex<VecDeque<Result<ApiResponse, TransportError>>>>,
}

impl RecordingTransport {
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().clone()
    }

    pub fn respond(&self, response: Result<ApiResponse, TransportError>) {
        self.responses.lock().push_back(response);
    }
}

impl HttpTransport for RecordingTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        self.requests.lock().push(request);
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(ApiResponse::new(200, b"{}".to_vec())))
    }
}
