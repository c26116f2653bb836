//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `BAZAAR_JWT_SECRET` - Session token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `BAZAAR_HOST` - Bind address (default: 127.0.0.1)
//! - `BAZAAR_PORT` - Listen port (default: 3000)
//! - `BAZAAR_DATA_DIR` - Directory holding `products.json` and `users.json` (default: data)
//! - `BAZAAR_ASSET_DIR` - Asset root served under `/assets` (default: public)
//! - `BAZAAR_CREDENTIALS_FILE` - Login credentials (default: `<data dir>/credentials.json`)
//! - `BAZAAR_SESSION_TTL_HOURS` - Session lifetime (default: 168)
//! - `BAZAAR_SECURE_COOKIES` - Mark the session cookie `Secure` (default: false)
//! - `BAZAAR_TRUST_PROXY` - Key the login limiter on `X-Forwarded-For` (default: false)
//! - `BAZAAR_DOWNLOAD_TIMEOUT_SECS` - Per-image timeout during sync (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_SESSION_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Directory holding the JSON documents
    pub data_dir: PathBuf,
    /// Root directory for served and uploaded assets
    pub asset_dir: PathBuf,
    /// JSON file with the login credential list
    pub credentials_file: PathBuf,
    /// Session token signing secret
    pub jwt_secret: SecretString,
    /// Session token and cookie lifetime
    pub session_ttl: chrono::Duration,
    /// Whether the session cookie carries `Secure`
    pub secure_cookies: bool,
    /// Whether `X-Forwarded-For`/`X-Real-IP` identify the client. Only set
    /// behind a reverse proxy that overwrites these headers.
    pub trust_proxy: bool,
    /// Per-image timeout during catalog sync
    pub download_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry transaction sample rate
    pub sentry_traces_sample_rate: f32,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = parse_env::<IpAddr>("BAZAAR_HOST", "127.0.0.1")?;
        let port = parse_env::<u16>("BAZAAR_PORT", "3000")?;
        let data_dir = PathBuf::from(get_env_or_default("BAZAAR_DATA_DIR", "data"));
        let asset_dir = PathBuf::from(get_env_or_default("BAZAAR_ASSET_DIR", "public"));
        let credentials_file = get_optional_env("BAZAAR_CREDENTIALS_FILE")
            .map_or_else(|| data_dir.join("credentials.json"), PathBuf::from);

        let jwt_secret = get_validated_secret("BAZAAR_JWT_SECRET")?;
        validate_session_secret(&jwt_secret, "BAZAAR_JWT_SECRET")?;

        let ttl_hours = parse_env::<u32>("BAZAAR_SESSION_TTL_HOURS", "168")?;
        if ttl_hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "BAZAAR_SESSION_TTL_HOURS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let secure_cookies = parse_bool_env("BAZAAR_SECURE_COOKIES", false)?;
        let trust_proxy = parse_bool_env("BAZAAR_TRUST_PROXY", false)?;
        let download_timeout =
            Duration::from_secs(parse_env::<u64>("BAZAAR_DOWNLOAD_TIMEOUT_SECS", "10")?);

        Ok(Self {
            host,
            port,
            data_dir,
            asset_dir,
            credentials_file,
            jwt_secret,
            session_ttl: chrono::Duration::hours(i64::from(ttl_hours)),
            secure_cookies,
            trust_proxy,
            download_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env::<f32>("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env::<f32>("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Configuration with default settings over the given directories.
    ///
    /// Used by the CLI and tests; the secret is not strength-checked.
    #[must_use]
    pub fn with_dirs(
        data_dir: impl Into<PathBuf>,
        asset_dir: impl Into<PathBuf>,
        jwt_secret: SecretString,
    ) -> Self {
        let data_dir = data_dir.into();
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            credentials_file: data_dir.join("credentials.json"),
            data_dir,
            asset_dir: asset_dir.into(),
            jwt_secret,
            session_ttl: chrono::Duration::hours(168),
            secure_cookies: false,
            trust_proxy: false,
            download_timeout: Duration::from_secs(10),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_env_or_default(key, default)
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_bool_env(key: &str, default: bool) -> Result<bool, ConfigError> {
    match get_optional_env(key) {
        None => Ok(default),
        Some(value) => parse_bool(&value).ok_or_else(|| {
            ConfigError::InvalidEnvVar(key.to_string(), format!("not a boolean: {value}"))
        }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Validate that a session secret meets minimum length requirements.
fn validate_session_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_SESSION_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SESSION_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= \
                 {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}
