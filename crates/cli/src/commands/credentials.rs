//! Login credential management.
//!
//! # Usage
//!
//! ```bash
//! # Print an argon2 hash for a password
//! echo 'correct horse battery' | bazaar-cli credentials hash
//!
//! # Append a credential to the credentials file
//! echo 'correct horse battery' | bazaar-cli credentials add -e admin@example.com -r admin
//! ```
//!
//! The server reads the credentials file once at startup, so restart it
//! after adding a credential.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};

use bazaar_core::{Email, EmailError, Role, RoleParseError};
use bazaar_storefront::services::auth::{AuthError, Credential, hash_password};

use super::Paths;

/// Errors that can occur during credential operations.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Invalid role.
    #[error(transparent)]
    InvalidRole(#[from] RoleParseError),

    /// Password rejected or hashing failed.
    #[error(transparent)]
    Password(#[from] AuthError),

    /// No password on stdin.
    #[error("No password provided on stdin")]
    MissingPassword,

    /// A credential already uses this email.
    #[error("Credential already exists for email: {0}")]
    Exists(String),

    /// Credentials file could not be read or written.
    #[error("Credentials file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Credentials file is not a credential list.
    #[error("Invalid credentials file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Hash a password read from stdin and print it.
///
/// # Errors
///
/// Returns an error if no password is given or it is too short.
#[allow(clippy::print_stdout)]
pub async fn hash() -> Result<(), CredentialError> {
    let password = read_password().await?;
    println!("{}", hash_password(&password)?);
    Ok(())
}

/// Append a credential with a password read from stdin.
///
/// # Errors
///
/// Returns an error if the email or role is invalid, the email is taken,
/// the password is too short or the file cannot be read or written.
pub async fn add(paths: &Paths, email: &str, role: &str) -> Result<(), CredentialError> {
    let email = Email::parse(email)?;
    let role: Role = role.parse()?;
    let password = read_password().await?;

    let credential = append(&paths.credentials_file, email, role, &password).await?;
    tracing::info!(
        id = credential.id,
        email = %credential.email,
        role = %credential.role,
        path = %paths.credentials_file.display(),
        "Credential added"
    );
    Ok(())
}

/// Add a credential to the file at `path`, creating it if missing.
/// The new id is one past the highest existing id.
async fn append(
    path: &Path,
    email: Email,
    role: Role,
    password: &str,
) -> Result<Credential, CredentialError> {
    let mut credentials = read_file(path).await?;
    if credentials.iter().any(|c| c.email == email) {
        return Err(CredentialError::Exists(email.to_string()));
    }

    let credential = Credential {
        id: credentials.iter().map(|c| c.id).max().unwrap_or(0) + 1,
        email,
        password_hash: hash_password(password)?,
        role,
    };
    credentials.push(credential.clone());

    let io_err = |source| CredentialError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    let mut bytes = serde_json::to_vec_pretty(&credentials).map_err(|source| {
        CredentialError::Parse {
            path: path.to_path_buf(),
            source,
        }
    })?;
    bytes.push(b'\n');
    tokio::fs::write(path, bytes).await.map_err(io_err)?;

    Ok(credential)
}

async fn read_file(path: &Path) -> Result<Vec<Credential>, CredentialError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|source| CredentialError::Parse {
            path: path.to_path_buf(),
            source,
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(source) => Err(CredentialError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

async fn read_password() -> Result<String, CredentialError> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .map_err(|source| CredentialError::Io {
            path: PathBuf::from("<stdin>"),
            source,
        })?;

    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CredentialError::MissingPassword);
    }
    Ok(password.to_string())
}
