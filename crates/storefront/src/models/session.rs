//! Session identity carried in the JWT cookie.

use serde::{Deserialize, Serialize};

use bazaar_core::{Email, Role};

/// Name of the cookie holding the session token.
pub const SESSION_COOKIE: &str = "token";

/// The logged-in identity, decoded from a verified session token.
///
/// `id` is the credential id, which is unrelated to user record ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: Email,
    pub role: Role,
}

impl CurrentUser {
    /// Whether this session may use the admin API.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}
