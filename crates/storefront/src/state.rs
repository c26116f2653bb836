//! Application state shared across handlers.

use std::sync::Arc;

use crate::catalog::sync::DownloadSettings;
use crate::config::StorefrontConfig;
use crate::db::RecordStore;
use crate::services::assets::AssetStore;
use crate::services::auth::{AuthError, AuthService, CredentialStore, TokenService};
use crate::services::remote::{HttpFetcher, RemoteError};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("credentials: {0}")]
    Credentials(#[from] AuthError),
    #[error("http client: {0}")]
    Http(#[from] RemoteError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the record store, asset store and auth services.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    records: RecordStore,
    assets: AssetStore,
    credentials: CredentialStore,
    tokens: TokenService,
    fetcher: HttpFetcher,
}

impl AppState {
    /// Create application state, loading credentials from the configured file.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials file is unreadable or invalid, or
    /// the HTTP client cannot be built.
    pub async fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let credentials = CredentialStore::load(&config.credentials_file).await?;
        Self::with_credentials(config, credentials)
    }

    /// Create application state with an explicit credential set.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_credentials(
        config: StorefrontConfig,
        credentials: CredentialStore,
    ) -> Result<Self, StateError> {
        let records = RecordStore::new(&config.data_dir);
        let assets = AssetStore::new(&config.asset_dir);
        let tokens = TokenService::new(&config.jwt_secret, config.session_ttl);
        let fetcher = HttpFetcher::new(config.download_timeout)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                records,
                assets,
                credentials,
                tokens,
                fetcher,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the record store.
    #[must_use]
    pub fn records(&self) -> &RecordStore {
        &self.inner.records
    }

    /// Get a reference to the asset store.
    #[must_use]
    pub fn assets(&self) -> &AssetStore {
        &self.inner.assets
    }

    /// Get a reference to the session token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Authentication service over the loaded credentials.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.credentials, &self.inner.tokens)
    }

    /// Get a reference to the HTTP client used for image downloads.
    #[must_use]
    pub fn fetcher(&self) -> &HttpFetcher {
        &self.inner.fetcher
    }

    /// Download settings for catalog sync.
    #[must_use]
    pub fn download_settings(&self) -> DownloadSettings {
        DownloadSettings::with_timeout(self.inner.config.download_timeout)
    }
}
