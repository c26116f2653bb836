//! HTTP client for remote catalogs and product images.

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::catalog::sync::IncomingProduct;

/// User agent sent with every request.
const USER_AGENT: &str = concat!("bazaar/", env!("CARGO_PKG_VERSION"));

/// Errors from remote fetches.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned a non-success status.
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// The fetch did not finish in time.
    #[error("timed out after {0:?}")]
    TimedOut(Duration),

    /// Failed to parse response.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Fetches raw bytes for a URL. Implemented over HTTP in production and
/// by in-memory fakes in tests.
pub trait ImageFetcher: Send + Sync {
    /// Download the body at `url`.
    fn fetch(&self, url: &Url) -> impl Future<Output = Result<Vec<u8>, RemoteError>> + Send;
}

/// reqwest-backed client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a client whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(timeout: Duration) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    /// Fetch a product array from a remote catalog URL.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails, the status is not 2xx or the
    /// body is not a product array.
    pub async fn fetch_catalog(&self, url: &Url) -> Result<Vec<IncomingProduct>, RemoteError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(e.to_string()))
    }
}

impl ImageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, RemoteError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.bytes().await?.to_vec())
    }
}
