//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness
//! GET    /health/ready               - Data directory reachable
//!
//! # Catalog
//! GET    /api/products               - List with owners (?category=&tag=&q=)
//! GET    /api/products/{slug}        - Detail by slug
//! GET    /api/categories             - Distinct categories
//!
//! # Session
//! POST   /api/auth/login             - Verify credentials, set cookie (rate limited)
//! POST   /api/auth/logout            - Clear cookie
//! GET    /api/auth/me                - Current session
//!
//! # Assets
//! GET    /assets/{*path}             - Stored files
//!
//! # Admin (admin session required)
//! GET    /api/admin/products         - List
//! POST   /api/admin/products         - Create
//! GET    /api/admin/products/{id}    - Detail
//! PATCH  /api/admin/products/{id}    - Partial update
//! DELETE /api/admin/products/{id}    - Delete
//! POST   /api/admin/products/sync    - Merge external catalog, fetch images
//! GET    /api/admin/users            - List
//! POST   /api/admin/users            - Create
//! GET    /api/admin/users/{id}       - Detail
//! PATCH  /api/admin/users/{id}       - Partial update
//! DELETE /api/admin/users/{id}       - Delete
//! POST   /api/admin/uploads          - Multipart image upload
//! ```

pub mod admin;
pub mod assets;
pub mod auth;
pub mod products;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    middleware::from_fn,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::middleware::{
    auth_rate_limiter, make_request_span, request_id_middleware, security_headers_middleware,
};
use crate::state::AppState;

/// Create the session routes router.
///
/// `trust_proxy` lets the login limiter key on proxy headers.
pub fn auth_routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .route(
            "/login",
            post(auth::login).layer(auth_rate_limiter(trust_proxy)),
        )
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Create the JSON API router.
pub fn api_routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .route("/products", get(products::index))
        .route("/products/{slug}", get(products::show))
        .route("/categories", get(products::categories))
        .nest("/auth", auth_routes(trust_proxy))
        .nest("/admin", admin::routes())
}

/// Create all routes for the storefront.
pub fn routes(trust_proxy: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api", api_routes(trust_proxy))
        .route("/assets/{*path}", get(assets::serve))
}

/// Full application with middleware, ready to serve.
pub fn app(state: AppState) -> Router {
    routes(state.config().trust_proxy)
        .layer(from_fn(security_headers_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the data directory is missing or unreadable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match tokio::fs::metadata(state.records().data_dir()).await {
        Ok(meta) if meta.is_dir() => StatusCode::OK,
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}
