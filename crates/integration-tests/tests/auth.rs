//! Login, session cookie and role checks.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use bazaar_integration_tests::{
    ADMIN_EMAIL, ADMIN_PASSWORD, CUSTOMER_EMAIL, TestApp, session_cookie_header,
};
use serde_json::json;

fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, session_cookie_header(token))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new().await;
    let response = app.login(ADMIN_EMAIL, ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);

    let cookie = response.header("set-cookie").unwrap();
    assert!(cookie.starts_with("token="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));

    let body = response.json();
    assert_eq!(body["user"]["email"], ADMIN_EMAIL);
    assert_eq!(body["user"]["role"], "admin");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_login_email_is_case_insensitive() {
    let app = TestApp::new().await;
    let response = app.login("Admin@Example.com", ADMIN_PASSWORD).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let app = TestApp::new().await;

    let wrong_password = app.login(ADMIN_EMAIL, "not-the-password").await;
    let unknown_email = app.login("nobody@example.com", ADMIN_PASSWORD).await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json(), unknown_email.json());
    assert!(wrong_password.header("set-cookie").is_none());
}

#[tokio::test]
async fn test_malformed_login_body() {
    let app = TestApp::new().await;
    let response = app
        .request(
            Method::POST,
            "/api/auth/login",
            Some(&json!({ "email": ADMIN_EMAIL })),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_me_with_cookie_and_bearer() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    let via_cookie = app.send(get_with_cookie("/api/auth/me", &token)).await;
    assert_eq!(via_cookie.status, StatusCode::OK);
    assert_eq!(via_cookie.json()["email"], ADMIN_EMAIL);

    let via_bearer = app
        .request(Method::GET, "/api/auth/me", None, Some(&token))
        .await;
    assert_eq!(via_bearer.status, StatusCode::OK);
    assert_eq!(via_bearer.json()["id"], 1);
}

#[tokio::test]
async fn test_me_requires_session() {
    let app = TestApp::new().await;
    assert_eq!(app.get("/api/auth/me").await.status, StatusCode::UNAUTHORIZED);

    let forged = app
        .request(Method::GET, "/api/auth/me", None, Some("not.a.token"))
        .await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;
    let response = app
        .request(Method::POST, "/api/auth/logout", None, None)
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(response.header("set-cookie").unwrap().contains("Max-Age=0"));
}

#[tokio::test]
async fn test_admin_routes_require_admin_session() {
    let app = TestApp::new().await;

    let anonymous = app.get("/api/admin/products").await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);

    let customer = app.customer_token().await;
    let forbidden = app
        .request(Method::GET, "/api/admin/products", None, Some(&customer))
        .await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

    let me = app
        .request(Method::GET, "/api/auth/me", None, Some(&customer))
        .await;
    assert_eq!(me.json()["email"], CUSTOMER_EMAIL);
    assert_eq!(me.json()["role"], "customer");

    let admin = app.admin_token().await;
    let allowed = app
        .request(Method::GET, "/api/admin/products", None, Some(&admin))
        .await;
    assert_eq!(allowed.status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_is_rate_limited() {
    let app = TestApp::new().await;
    let mut statuses = Vec::new();
    for _ in 0..8 {
        statuses.push(app.login(ADMIN_EMAIL, "wrong-password").await.status);
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_forwarded_for_does_not_escape_rate_limit() {
    let app = TestApp::new().await;
    let mut statuses = Vec::new();
    for i in 0..8 {
        let body = json!({ "email": ADMIN_EMAIL, "password": "wrong-password" });
        let request = Request::builder()
            .method(Method::POST)
            .uri("/api/auth/login")
            .header(header::CONTENT_TYPE, "application/json")
            .header("x-forwarded-for", format!("198.51.100.{i}"))
            .body(Body::from(body.to_string()))
            .unwrap();
        statuses.push(app.send(request).await.status);
    }
    assert!(statuses.contains(&StatusCode::TOO_MANY_REQUESTS));
}

#[tokio::test]
async fn test_credentials_are_not_user_records() {
    let app = TestApp::new().await;
    let token = app.admin_token().await;

    // Logging in never creates a user record
    let users = app
        .request(Method::GET, "/api/admin/users", None, Some(&token))
        .await;
    assert_eq!(users.status, StatusCode::OK);
    assert_eq!(users.json(), json!([]));
    assert!(!app.data_dir().join("users.json").exists());
}
