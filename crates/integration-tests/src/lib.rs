//! Integration tests for Bazaar.
//!
//! Tests drive the full storefront router in process: every request goes
//! through the same middleware stack as the server, against a record store
//! and asset root in a temporary directory.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p bazaar-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `catalog` - Public product listing, lookup and assets
//! - `auth` - Login, session cookie and role checks
//! - `admin` - Product and user management, uploads, sync

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use axum::{
    Router,
    body::{Body, Bytes, to_bytes},
    extract::ConnectInfo,
    http::{HeaderMap, HeaderValue, Method, Request, StatusCode, header},
};
use secrecy::SecretString;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use bazaar_core::{Email, Role};
use bazaar_storefront::config::StorefrontConfig;
use bazaar_storefront::routes;
use bazaar_storefront::services::auth::{Credential, CredentialStore, hash_password};
use bazaar_storefront::state::AppState;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password-1";
pub const CUSTOMER_EMAIL: &str = "shopper@example.com";
pub const CUSTOMER_PASSWORD: &str = "shopper-password-1";

/// Peer address attached to every request so the login rate limiter has a key.
const CLIENT_ADDR: ([u8; 4], u16) = ([203, 0, 113, 10], 40000);

/// A storefront over a throwaway data directory.
pub struct TestApp {
    dir: TempDir,
    state: AppState,
    router: Router,
}

/// A buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON.
    ///
    /// # Panics
    ///
    /// Panics if the body is not JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response body is JSON")
    }

    /// A header as a string, if present.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    /// Build an app with one admin and one customer credential.
    ///
    /// # Panics
    ///
    /// Panics if the temporary directories cannot be created.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = StorefrontConfig::with_dirs(
            dir.path().join("data"),
            dir.path().join("public"),
            SecretString::from("integration-test-secret-with-enough-length".to_string()),
        );

        let credentials = CredentialStore::new(vec![
            credential(1, ADMIN_EMAIL, ADMIN_PASSWORD, Role::Admin),
            credential(2, CUSTOMER_EMAIL, CUSTOMER_PASSWORD, Role::Customer),
        ]);
        let state =
            AppState::with_credentials(config, credentials).expect("build application state");
        state
            .records()
            .ensure_data_dir()
            .await
            .expect("create data dir");
        state.assets().ensure_dirs().await.expect("create asset dirs");

        let router = routes::app(state.clone());
        Self { dir, state, router }
    }

    /// Shared application state.
    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    /// Directory holding `products.json` and `users.json`.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.dir.path().join("data")
    }

    /// Asset root.
    #[must_use]
    pub fn asset_dir(&self) -> PathBuf {
        self.dir.path().join("public")
    }

    /// Write a raw record document.
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub async fn write_document(&self, file: &str, document: &Value) {
        write_json(&self.data_dir().join(file), document).await;
    }

    /// Read a raw record document.
    ///
    /// # Panics
    ///
    /// Panics if the file is missing or not JSON.
    pub async fn read_document(&self, file: &str) -> Value {
        let bytes = tokio::fs::read(self.data_dir().join(file))
            .await
            .expect("read document");
        serde_json::from_slice(&bytes).expect("document is JSON")
    }

    /// Send a request, optionally with a JSON body and a bearer token.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<&Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("build request");

        self.send(request).await
    }

    /// Send a prepared request from the test client's peer address.
    ///
    /// # Panics
    ///
    /// Panics if the body cannot be read.
    pub async fn send(&self, mut request: Request<Body>) -> TestResponse {
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(CLIENT_ADDR)));
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .unwrap_or_else(|e| match e {});
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, None).await
    }

    /// Log in and return the full response.
    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        let body = serde_json::json!({ "email": email, "password": password });
        self.request(Method::POST, "/api/auth/login", Some(&body), None)
            .await
    }

    /// Log in and return the session token.
    ///
    /// # Panics
    ///
    /// Panics if the login fails.
    pub async fn token_for(&self, email: &str, password: &str) -> String {
        let response = self.login(email, password).await;
        assert_eq!(response.status, StatusCode::OK, "login failed for {email}");
        response.json()["token"]
            .as_str()
            .expect("token in login response")
            .to_string()
    }

    pub async fn admin_token(&self) -> String {
        self.token_for(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    pub async fn customer_token(&self) -> String {
        self.token_for(CUSTOMER_EMAIL, CUSTOMER_PASSWORD).await
    }
}

/// `Cookie` header value for a session token.
///
/// # Panics
///
/// Panics if the token is not a valid header value.
#[must_use]
pub fn session_cookie_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("token={token}")).expect("token is a valid header value")
}

/// Write a JSON value to `path`.
///
/// # Panics
///
/// Panics if the file cannot be written.
pub async fn write_json(path: &Path, value: &Value) {
    let bytes = serde_json::to_vec_pretty(value).expect("encode JSON");
    tokio::fs::write(path, bytes).await.expect("write JSON file");
}

fn credential(id: i64, email: &str, password: &str, role: Role) -> Credential {
    Credential {
        id,
        email: Email::parse(email).expect("valid email"),
        password_hash: hash_password(password).expect("hash password"),
        role,
    }
}
