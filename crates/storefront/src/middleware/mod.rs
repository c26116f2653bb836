//! HTTP middleware stack for the storefront API.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request spans, with a `request_id` field)
//! 3. Request ID (accept or generate `x-request-id`)
//! 4. Security headers
//! 5. Rate limiting on `POST /api/auth/login` (governor)
//!
//! Authentication is not a layer: handlers opt in through the
//! [`RequireAuth`] and [`RequireAdmin`] extractors.

pub mod auth;
pub mod rate_limit;
pub mod request_id;
pub mod security_headers;

pub use auth::{RequireAdmin, RequireAuth, clear_session_cookie, session_cookie, session_token};
pub use rate_limit::auth_rate_limiter;
pub use request_id::{REQUEST_ID_HEADER, make_request_span, request_id_middleware};
pub use security_headers::security_headers_middleware;
