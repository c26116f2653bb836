//! Catalog sync from a file or a remote endpoint.
//!
//! # Usage
//!
//! ```bash
//! bazaar-cli sync --file products-export.json
//! bazaar-cli sync --url https://vendor.example.com/catalog.json
//! ```
//!
//! # Environment Variables
//!
//! - `BAZAAR_DOWNLOAD_TIMEOUT_SECS` - Per-image timeout (default 10)

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;
use tracing::{info, warn};
use url::Url;

use bazaar_storefront::catalog::sync::{
    DownloadSettings, ImageStatus, IncomingProduct, SyncError, sync_catalog,
};
use bazaar_storefront::db::{RecordStore, RepositoryError};
use bazaar_storefront::services::assets::AssetStore;
use bazaar_storefront::services::remote::{HttpFetcher, RemoteError};

use super::Paths;

/// Where the incoming product list comes from.
#[derive(Debug, Clone)]
pub enum Source {
    File(PathBuf),
    Url(Url),
}

/// Errors that can occur during a sync.
#[derive(Debug, Error)]
pub enum SyncCommandError {
    /// Product list file could not be read.
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Product list file is not a JSON product list.
    #[error("Invalid product list in {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    /// Remote endpoint failed.
    #[error("Remote catalog: {0}")]
    Remote(#[from] RemoteError),

    /// Merge or persist failed.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Timeout setting is not a number of seconds.
    #[error("Invalid BAZAAR_DOWNLOAD_TIMEOUT_SECS: {0}")]
    InvalidTimeout(String),

    /// Data directory could not be created.
    #[error("Failed to prepare data directory: {0}")]
    Repository(#[from] RepositoryError),

    /// Asset directories could not be created.
    #[error("Failed to prepare asset directories: {0}")]
    Assets(#[from] bazaar_storefront::services::assets::AssetError),
}

/// Merge a product list into the catalog and download its images.
///
/// # Errors
///
/// Returns an error if the list cannot be loaded or the catalog cannot be
/// read or written. Failed image downloads are logged, not returned.
pub async fn run(paths: &Paths, source: Source) -> Result<(), SyncCommandError> {
    let timeout = download_timeout()?;
    let fetcher = HttpFetcher::new(timeout)?;

    let incoming = match source {
        Source::File(path) => read_file(path).await?,
        Source::Url(url) => {
            info!(%url, "Fetching remote catalog");
            fetcher.fetch_catalog(&url).await?
        }
    };
    info!(count = incoming.len(), "Loaded product list");

    let store = RecordStore::new(&paths.data_dir);
    let assets = AssetStore::new(&paths.asset_dir);
    store.ensure_data_dir().await?;
    assets.ensure_dirs().await?;

    let report = sync_catalog(
        &store,
        &assets,
        &fetcher,
        incoming,
        DownloadSettings::with_timeout(timeout),
    )
    .await?;

    let mut failed = 0_usize;
    for outcome in &report.images {
        if let ImageStatus::Failed { error } = &outcome.status {
            failed += 1;
            warn!(
                product_id = %outcome.product_id,
                url = %outcome.url,
                %error,
                "Image not downloaded"
            );
        }
    }

    info!(
        replaced = report.merge.replaced.len(),
        appended = report.merge.appended.len(),
        images = report.images.len(),
        failed,
        "Sync complete"
    );
    Ok(())
}

async fn read_file(path: PathBuf) -> Result<Vec<IncomingProduct>, SyncCommandError> {
    let bytes = match tokio::fs::read(&path).await {
        Ok(bytes) => bytes,
        Err(source) => return Err(SyncCommandError::Read { path, source }),
    };
    serde_json::from_slice(&bytes).map_err(|source| SyncCommandError::Parse { path, source })
}

fn download_timeout() -> Result<Duration, SyncCommandError> {
    match std::env::var("BAZAAR_DOWNLOAD_TIMEOUT_SECS") {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| SyncCommandError::InvalidTimeout(value)),
        _ => Ok(Duration::from_secs(10)),
    }
}
