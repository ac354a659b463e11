//! End-to-end session flow against a fake identity provider and backend.
//!
//! The fake serves the realm's token, userinfo and logout endpoints plus the
//! profile API on an ephemeral port, and the real reqwest adapters talk to it.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use axum::extract::{Path as UrlPath, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Duration;
use pretty_assertions::assert_eq;
use serde_json::json;
use tempfile::tempdir;

use storefront_application::ports::KeyValueStore;
use storefront_application::{
    AuthClient, AuthInterceptor, HttpTransport, ProfileService, SessionStateHolder,
};
use storefront_domain::{ApiRequest, AppConfig, AuthError, KeycloakConfig};
use storefront_infrastructure::{
    FileKeyValueStore, KeycloakProvider, ManualClock, ReqwestTransport, TokioFileSystem,
};

const REALM_PATH: &str = "/realms/ecommerce/protocol/openid-connect";

#[derive(Default)]
struct FakeServer {
    expires_in: AtomicU64,
    serial: AtomicUsize,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    seen_authorization: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeServer {
    fn record(&self, endpoint: &str, authorization: Option<String>) {
        self.seen_authorization
            .lock()
            .unwrap()
            .push((endpoint.to_string(), authorization));
    }

    fn seen(&self) -> Vec<(String, Option<String>)> {
        self.seen_authorization.lock().unwrap().clone()
    }

    fn issue(&self) -> serde_json::Value {
        let serial = self.serial.fetch_add(1, Ordering::SeqCst);
        let claims = json!({
            "sub": "user-42",
            "email": "ana@shop.test",
            "email_verified": true,
            "name": "Ana Ruiz",
            "preferred_username": "ana",
            "jti": serial,
        });
        let access_token = format!(
            "{}.{}.sig",
            URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#),
            URL_SAFE_NO_PAD.encode(claims.to_string())
        );
        json!({
            "access_token": access_token,
            "refresh_token": format!("refresh-{serial}"),
            "expires_in": self.expires_in.load(Ordering::SeqCst),
            "token_type": "Bearer",
            "scope": "openid email profile",
        })
    }
}

fn authorization(headers: &HeaderMap) -> Option<String> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

async fn token(
    State(server): State<Arc<FakeServer>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let grant = form.get("grant_type").map(String::as_str);
    match grant {
        Some("password") if form.get("password").map(String::as_str) == Some("correct-horse") => {
            Json(server.issue()).into_response()
        }
        Some("refresh_token") if form.get("refresh_token").is_some_and(|t| t.starts_with("refresh-")) => {
            server.refresh_calls.fetch_add(1, Ordering::SeqCst);
            Json(server.issue()).into_response()
        }
        _ => (
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid_grant", "error_description": "Invalid user credentials"})),
        )
            .into_response(),
    }
}

async fn userinfo(State(server): State<Arc<FakeServer>>, headers: HeaderMap) -> Response {
    let bearer = authorization(&headers);
    server.record("userinfo", bearer.clone());
    if bearer.is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "sub": "user-42",
        "email": "ana@shop.test",
        "email_verified": true,
        "name": "Ana Ruiz",
        "preferred_username": "ana",
    }))
    .into_response()
}

async fn logout(State(server): State<Arc<FakeServer>>) -> StatusCode {
    server.logout_calls.fetch_add(1, Ordering::SeqCst);
    StatusCode::NO_CONTENT
}

async fn profile(
    State(server): State<Arc<FakeServer>>,
    UrlPath(id): UrlPath<String>,
    headers: HeaderMap,
) -> Response {
    let bearer = authorization(&headers);
    server.record("profile", bearer.clone());
    if bearer.is_none() {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({
        "imagen": null,
        "nombre": format!("Cliente {id}"),
        "email": "ana@shop.test",
        "fechaRegistro": "2024-03-01",
        "pedidos": [],
    }))
    .into_response()
}

async fn spawn_server(expires_in: u64) -> (SocketAddr, Arc<FakeServer>) {
    let server = Arc::new(FakeServer::default());
    server.expires_in.store(expires_in, Ordering::SeqCst);

    let app = Router::new()
        .route(&format!("{REALM_PATH}/token"), post(token))
        .route(&format!("{REALM_PATH}/userinfo"), get(userinfo))
        .route(&format!("{REALM_PATH}/logout"), post(logout))
        .route("/api/usuarios/{id}", get(profile))
        .with_state(Arc::clone(&server));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, server)
}

fn config(addr: SocketAddr) -> AppConfig {
    AppConfig {
        api_url: format!("http://{addr}/api"),
        keycloak: KeycloakConfig {
            url: format!("http://{addr}"),
            ..KeycloakConfig::default()
        },
        ..AppConfig::default()
    }
}

type Client = AuthClient<KeycloakProvider, FileKeyValueStore<TokioFileSystem>, ManualClock>;

fn client(config: &AppConfig, dir: &Path, clock: &ManualClock) -> Arc<Client> {
    Arc::new(AuthClient::new(
        Arc::new(KeycloakProvider::new(&config.keycloak)),
        FileKeyValueStore::new(TokioFileSystem::new(), dir.join("session.json")),
        Arc::new(SessionStateHolder::new()),
        clock.clone(),
    ))
}

#[tokio::test]
async fn test_login_restore_profile_logout() {
    let (addr, server) = spawn_server(3600).await;
    let config = config(addr);
    let dir = tempdir().unwrap();
    let clock = ManualClock::default();

    let auth = client(&config, dir.path(), &clock);
    let state = auth.login("ana", "correct-horse").await.unwrap();
    assert!(state.authenticated);
    assert_eq!(state.user.as_ref().unwrap().subject_id, "user-42");

    // A fresh process sees the same session from disk.
    let restarted = client(&config, dir.path(), &clock);
    let restored = restarted.restore_session().await;
    assert!(restored.authenticated);
    assert_eq!(restored.user, state.user);

    let transport = AuthInterceptor::new(ReqwestTransport::new().unwrap(), Arc::clone(&restarted));
    let profiles = ProfileService::new(transport, config.api_url.clone());
    let profile = profiles.load_profile("7").await.unwrap();
    assert_eq!(profile.name, "Cliente 7");
    assert_eq!(
        server.seen(),
        vec![("profile".to_string(), Some(format!("Bearer {}", state.token.unwrap())))]
    );

    restarted.logout().await;
    restarted.wait_for_end_session().await;
    assert_eq!(server.logout_calls.load(Ordering::SeqCst), 1);
    let storage = FileKeyValueStore::new(TokioFileSystem::new(), dir.path().join("session.json"));
    for key in ["access_token", "refresh_token", "token_expiry"] {
        assert_eq!(storage.get(key).await.unwrap(), None);
    }
}

#[tokio::test]
async fn test_wrong_password_is_rejected() {
    let (addr, _server) = spawn_server(3600).await;
    let dir = tempdir().unwrap();
    let auth = client(&config(addr), dir.path(), &ManualClock::default());

    let error = auth.login("ana", "nope").await.unwrap_err();

    assert_eq!(error, AuthError::InvalidCredentials);
    assert!(!auth.current_session().authenticated);
}

#[tokio::test]
async fn test_expiring_token_is_refreshed_once_before_request() {
    let (addr, server) = spawn_server(60).await;
    let config = config(addr);
    let dir = tempdir().unwrap();
    let clock = ManualClock::default();
    let auth = client(&config, dir.path(), &clock);
    auth.login("ana", "correct-horse").await.unwrap();
    clock.advance(Duration::seconds(56));

    let transport = AuthInterceptor::new(ReqwestTransport::new().unwrap(), Arc::clone(&auth));
    let profiles = ProfileService::new(transport, config.api_url.clone());
    profiles.load_profile("7").await.unwrap();

    assert_eq!(server.refresh_calls.load(Ordering::SeqCst), 1);
    let refreshed = auth.access_token().await.unwrap();
    assert_eq!(
        server.seen()[0].1,
        Some(format!("Bearer {refreshed}"))
    );
}

#[tokio::test]
async fn test_identity_provider_url_is_sent_without_credentials() {
    let (addr, server) = spawn_server(3600).await;
    let config = config(addr);
    let dir = tempdir().unwrap();
    let auth = client(&config, dir.path(), &ManualClock::default());
    auth.login("ana", "correct-horse").await.unwrap();

    let transport = AuthInterceptor::new(ReqwestTransport::new().unwrap(), Arc::clone(&auth));
    let response = transport
        .send(ApiRequest::get(config.keycloak.userinfo_endpoint()))
        .await
        .unwrap();

    assert_eq!(response.status, 401);
    assert_eq!(
        server.seen(),
        vec![("userinfo".to_string(), None)]
    );

    // The auth client itself still authenticates its own userinfo call.
    let info = auth.fetch_user_info().await.unwrap();
    assert_eq!(info.subject_id, "user-42");
}
