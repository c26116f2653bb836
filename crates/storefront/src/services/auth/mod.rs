//! Authentication service.
//!
//! Email/password login against a credential list, with the session carried
//! in a signed token.

mod credentials;
mod error;
mod token;

pub use credentials::{Credential, CredentialStore, hash_password, validate_password};
pub use error::AuthError;
pub use token::TokenService;

use crate::models::CurrentUser;

/// Authentication service.
pub struct AuthService<'a> {
    credentials: &'a CredentialStore,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(credentials: &'a CredentialStore, tokens: &'a TokenService) -> Self {
        Self {
            credentials,
            tokens,
        }
    }

    /// Login with email and password, returning the identity and a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub fn login(&self, email: &str, password: &str) -> Result<(CurrentUser, String), AuthError> {
        let credential = self.credentials.verify(email, password)?;
        let user = CurrentUser {
            id: credential.id,
            email: credential.email.clone(),
            role: credential.role,
        };
        let token = self.tokens.issue(&user)?;

        tracing::info!(credential_id = user.id, role = %user.role, "login succeeded");
        Ok((user, token))
    }

    /// Resolve a session token to its identity.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token does not verify.
    pub fn authenticate(&self, token: &str) -> Result<CurrentUser, AuthError> {
        self.tokens.verify(token)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bazaar_core::{Email, Role};
    use chrono::Duration;
    use secrecy::SecretString;

    #[test]
    fn test_login_issues_token_for_credential() {
        let credentials = CredentialStore::new(vec![Credential {
            id: 5,
            email: Email::parse("shop@example.com").unwrap(),
            password_hash: hash_password("open sesame").unwrap(),
            role: Role::Customer,
        }]);
        let tokens = TokenService::new(
            &SecretString::from("k3y-for-tests-0123456789abcdef!!".to_owned()),
            Duration::hours(1),
        );
        let auth = AuthService::new(&credentials, &tokens);

        let (user, token) = auth.login("shop@example.com", "open sesame").unwrap();
        assert_eq!(user.id, 5);
        assert!(!user.is_admin());
        assert_eq!(auth.authenticate(&token).unwrap(), user);

        assert!(matches!(
            auth.login("shop@example.com", "closed"),
            Err(AuthError::InvalidCredentials)
        ));
    }
}
