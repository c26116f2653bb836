//! Session route handlers.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{RequireAuth, clear_session_cookie, session_cookie};
use crate::models::CurrentUser;
use crate::state::AppState;

/// Login request body.
#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Login response body. The token is also set as the session cookie.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub user: CurrentUser,
    pub token: String,
}

/// Verify credentials and start a session.
///
/// POST /api/auth/login
///
/// # Errors
///
/// Returns 401 for unknown email or wrong password, without saying which.
pub async fn login(
    State(state): State<AppState>,
    payload: std::result::Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response> {
    let Json(request) = payload?;

    let (user, token) = state
        .auth()
        .login(&request.email, &request.password)
        .inspect_err(|e| tracing::info!(error = %e, "login failed"))?;

    let cookie = session_cookie(&token, state.tokens().ttl(), state.config().secure_cookies)
        .map_err(|e| AppError::Internal(format!("session cookie: {e}")))?;
    set_sentry_user(&user.id, Some(user.email.as_str()));

    Ok((
        StatusCode::OK,
        [(SET_COOKIE, cookie)],
        Json(LoginResponse { user, token }),
    )
        .into_response())
}

/// End the session by clearing the cookie. Tokens are stateless, so a
/// bearer token stays valid until it expires.
///
/// POST /api/auth/logout
pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    clear_sentry_user();
    (
        StatusCode::NO_CONTENT,
        [(SET_COOKIE, clear_session_cookie(state.config().secure_cookies))],
    )
}

/// The identity behind the current session.
///
/// GET /api/auth/me
pub async fn me(RequireAuth(user): RequireAuth) -> Json<CurrentUser> {
    Json(user)
}
