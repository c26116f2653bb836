//! Login credentials, kept apart from user records.
//!
//! Credentials live in their own JSON file (`[Credential, ...]`) and are
//! loaded once at startup. Their ids have no relation to user record ids.

use std::io::ErrorKind;
use std::path::Path;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::{Deserialize, Serialize};

use bazaar_core::{Email, Role};

use super::AuthError;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// A login identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub id: i64,
    pub email: Email,
    pub password_hash: String,
    pub role: Role,
}

/// In-memory set of credentials.
#[derive(Debug, Clone, Default)]
pub struct CredentialStore {
    credentials: Vec<Credential>,
}

impl CredentialStore {
    /// Create a store from a list of credentials.
    #[must_use]
    pub const fn new(credentials: Vec<Credential>) -> Self {
        Self { credentials }
    }

    /// Load credentials from a JSON file. A missing file yields an empty
    /// store, so nobody can log in until one is provided.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::CredentialsRead` on I/O failure and
    /// `AuthError::CredentialsParse` if the file is not a credential list.
    pub async fn load(path: &Path) -> Result<Self, AuthError> {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::warn!(
                    path = %path.display(),
                    "credentials file not found, login disabled"
                );
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(AuthError::CredentialsRead {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let credentials: Vec<Credential> =
            serde_json::from_slice(&bytes).map_err(|source| AuthError::CredentialsParse {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::info!(count = credentials.len(), "credentials loaded");
        Ok(Self::new(credentials))
    }

    /// Number of credentials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.credentials.len()
    }

    /// Whether the store has no credentials.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.credentials.is_empty()
    }

    /// Find a credential by email.
    #[must_use]
    pub fn find_by_email(&self, email: &Email) -> Option<&Credential> {
        self.credentials.iter().find(|c| &c.email == email)
    }

    /// Check an email/password pair.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for a malformed email, an
    /// unknown email or a wrong password, without saying which.
    pub fn verify(&self, email: &str, password: &str) -> Result<&Credential, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let credential = self
            .find_by_email(&email)
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &credential.password_hash)?;
        Ok(credential)
    }
}

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with argon2 and a random salt.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short and
/// `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    validate_password(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn store() -> CredentialStore {
        CredentialStore::new(vec![Credential {
            id: 1,
            email: Email::parse("admin@example.com").unwrap(),
            password_hash: hash_password("correct horse").unwrap(),
            role: Role::Admin,
        }])
    }

    #[test]
    fn test_verify_accepts_correct_password() {
        let store = store();
        let credential = store.verify("Admin@Example.com", "correct horse").unwrap();
        assert_eq!(credential.id, 1);
        assert!(credential.role.is_admin());
    }

    #[test]
    fn test_wrong_password_and_unknown_email_look_the_same() {
        let store = store();
        assert!(matches!(
            store.verify("admin@example.com", "wrong password"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            store.verify("nobody@example.com", "correct horse"),
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            store.verify("not-an-email", "correct horse"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_corrupt_hash_is_invalid_credentials() {
        let store = CredentialStore::new(vec![Credential {
            id: 2,
            email: Email::parse("c@example.com").unwrap(),
            password_hash: "plaintext".to_owned(),
            role: Role::Customer,
        }]);
        assert!(matches!(
            store.verify("c@example.com", "plaintext"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hash_password_rejects_short() {
        assert!(matches!(
            hash_password("short"),
            Err(AuthError::WeakPassword(_))
        ));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let missing = CredentialStore::load(&path).await.unwrap();
        assert!(missing.is_empty());

        let hash = hash_password("sup3r-secret").unwrap();
        let json = serde_json::json!([
            {"id": 7, "email": "ops@example.com", "passwordHash": hash, "role": "admin"}
        ]);
        tokio::fs::write(&path, serde_json::to_vec(&json).unwrap())
            .await
            .unwrap();

        let loaded = CredentialStore::load(&path).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            loaded.verify("ops@example.com", "sup3r-secret").unwrap().id,
            7
        );

        tokio::fs::write(&path, b"{}").await.unwrap();
        assert!(matches!(
            CredentialStore::load(&path).await,
            Err(AuthError::CredentialsParse { .. })
        ));
    }
}
