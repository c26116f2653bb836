//! Authentication extractors and session cookie helpers.
//!
//! The session token is read from the `token` cookie first, then from an
//! `Authorization: Bearer` header.

use axum::{
    extract::FromRequestParts,
    http::{
        HeaderMap, HeaderValue,
        header::{AUTHORIZATION, COOKIE, InvalidHeaderValue},
        request::Parts,
    },
};

use crate::error::AppError;
use crate::models::{CurrentUser, SESSION_COOKIE};
use crate::state::AppState;

/// Extractor that requires a valid session.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireAuth(user): RequireAuth,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| AppError::Unauthorized("login required".to_string()))?;

        let user = state.auth().authenticate(&token).map_err(|e| {
            tracing::debug!(error = %e, "rejected session token");
            AppError::Unauthorized("invalid or expired session".to_string())
        })?;

        Ok(Self(user))
    }
}

/// Extractor that requires a valid session with the admin role.
///
/// Missing or invalid sessions are 401; non-admin sessions are 403.
pub struct RequireAdmin(pub CurrentUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireAuth(user) = RequireAuth::from_request_parts(parts, state).await?;
        if !user.is_admin() {
            tracing::warn!(credential_id = user.id, "non-admin session on admin route");
            return Err(AppError::Forbidden("admin role required".to_string()));
        }
        Ok(Self(user))
    }
}

/// Session token from the cookie, falling back to a bearer header.
#[must_use]
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, SESSION_COOKIE).or_else(|| bearer_token(headers))
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
}

/// `Set-Cookie` value carrying a session token.
///
/// # Errors
///
/// Returns an error if the token contains bytes not allowed in a header.
pub fn session_cookie(
    token: &str,
    ttl: chrono::Duration,
    secure: bool,
) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}{}",
        ttl.num_seconds().max(0),
        if secure { "; Secure" } else { "" }
    ))
}

/// `Set-Cookie` value that clears the session cookie.
#[must_use]
pub fn clear_session_cookie(secure: bool) -> HeaderValue {
    if secure {
        HeaderValue::from_static("token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0; Secure")
    } else {
        HeaderValue::from_static("token=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(*name, HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn test_cookie_wins_over_bearer() {
        let map = headers(&[
            ("cookie", "theme=dark; token=from-cookie"),
            ("authorization", "Bearer from-header"),
        ]);
        assert_eq!(session_token(&map).as_deref(), Some("from-cookie"));
    }

    #[test]
    fn test_bearer_fallback() {
        let map = headers(&[("authorization", "Bearer abc.def.ghi")]);
        assert_eq!(session_token(&map).as_deref(), Some("abc.def.ghi"));

        let empty_cookie = headers(&[("cookie", "token="), ("authorization", "Bearer xyz")]);
        assert_eq!(session_token(&empty_cookie).as_deref(), Some("xyz"));
    }

    #[test]
    fn test_no_token() {
        assert_eq!(session_token(&HeaderMap::new()), None);
        let map = headers(&[("authorization", "Basic dXNlcjpwYXNz")]);
        assert_eq!(session_token(&map), None);
        let similar = headers(&[("cookie", "xtoken=nope")]);
        assert_eq!(session_token(&similar), None);
    }

    #[test]
    fn test_cookie_attributes() {
        let cookie = session_cookie("abc", chrono::Duration::hours(1), false).unwrap();
        let text = cookie.to_str().unwrap();
        assert!(text.starts_with("token=abc;"));
        assert!(text.contains("HttpOnly"));
        assert!(text.contains("SameSite=Lax"));
        assert!(text.contains("Path=/"));
        assert!(text.contains("Max-Age=3600"));
        assert!(!text.contains("Secure"));

        let secure = session_cookie("abc", chrono::Duration::hours(1), true).unwrap();
        assert!(secure.to_str().unwrap().ends_with("; Secure"));

        assert!(
            clear_session_cookie(false)
                .to_str()
                .unwrap()
                .contains("Max-Age=0")
        );
    }
}
