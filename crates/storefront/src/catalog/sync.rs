//! Catalog sync: merge an incoming product list into the stored one, then
//! fetch remote images.
//!
//! The merge is pure and is persisted before any download starts. Downloads
//! are best-effort: each runs under its own timeout, a bounded number run at
//! once, and a failed download is reported without undoing the merge.

use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;
use url::Url;

use bazaar_core::{Price, ProductId, UserId, slugify};

use crate::db::{RecordStore, RepositoryError};
use crate::models::product::{validate_name, validate_price};
use crate::models::{Product, is_absolute_url};
use crate::services::assets::{AssetError, AssetStore, sanitize_file_name};
use crate::services::remote::{ImageFetcher, RemoteError};

/// Downloads in flight at once.
pub const MAX_CONCURRENT_DOWNLOADS: usize = 4;

/// Errors that abort a sync.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The stored product document could not be read or written.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A product record as supplied by an external catalog.
///
/// `slug` and `createdAt` may be omitted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingProduct {
    pub id: ProductId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub storage: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub mobile_image: Option<String>,
    #[serde(default)]
    pub desktop_image: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub slug: Option<String>,
}

impl IncomingProduct {
    /// Apply the same name and price checks as a create.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation`, naming the product id, if the
    /// name is blank or the price is negative.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        validate_name(&self.name)
            .and_then(|()| validate_price(self.price))
            .map_err(|e| match e {
                RepositoryError::Validation(msg) => {
                    RepositoryError::Validation(format!("product {}: {msg}", self.id))
                }
                other => other,
            })
    }

    fn into_product(self, existing: Option<&Product>, now: DateTime<Utc>) -> Product {
        let created_at = self
            .created_at
            .or_else(|| existing.map(|p| p.created_at))
            .unwrap_or(now);
        let slug = self
            .slug
            .map(|s| slugify(&s))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&self.name));

        Product {
            id: self.id,
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            tags: self.tags,
            highlights: self.highlights,
            format: self.format,
            storage: self.storage,
            image: self.image,
            mobile_image: self.mobile_image.filter(|s| !s.is_empty()),
            desktop_image: self.desktop_image.filter(|s| !s.is_empty()),
            user_id: self.user_id,
            created_at,
            slug,
        }
    }
}

/// Which ids a merge replaced and which it appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub replaced: Vec<ProductId>,
    pub appended: Vec<ProductId>,
}

/// Merge `incoming` into `existing`.
///
/// A record whose id is already present replaces it in place; any other
/// record is appended, in input order. Existing records not mentioned are
/// kept unchanged.
#[must_use]
pub fn merge(
    existing: Vec<Product>,
    incoming: Vec<IncomingProduct>,
    now: DateTime<Utc>,
) -> (Vec<Product>, MergeReport) {
    let mut merged = existing;
    let mut report = MergeReport::default();

    for item in incoming {
        match merged.iter().position(|p| p.id == item.id) {
            Some(index) => {
                let id = item.id;
                if let Some(slot) = merged.get_mut(index) {
                    let product = item.into_product(Some(slot), now);
                    *slot = product;
                }
                if !report.replaced.contains(&id) && !report.appended.contains(&id) {
                    report.replaced.push(id);
                }
            }
            None => {
                report.appended.push(item.id);
                merged.push(item.into_product(None, now));
            }
        }
    }

    (merged, report)
}

/// Result of one image download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImageStatus {
    /// Fetched and written to `path`.
    Downloaded { path: String },
    /// A file with the same name was already stored (or queued earlier in this sync).
    SkippedExisting { path: String },
    /// Could not be fetched or stored.
    Failed { error: String },
}

/// Outcome of the image download for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageOutcome {
    pub product_id: ProductId,
    pub url: String,
    #[serde(flatten)]
    pub status: ImageStatus,
}

/// Everything a sync did.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    #[serde(flatten)]
    pub merge: MergeReport,
    pub images: Vec<ImageOutcome>,
}

/// Settings for the download phase.
#[derive(Debug, Clone, Copy)]
pub struct DownloadSettings {
    /// Per-download timeout.
    pub timeout: Duration,
    /// Downloads in flight at once.
    pub concurrency: usize,
}

impl DownloadSettings {
    /// Settings with the given timeout and the default fan-out.
    #[must_use]
    pub const fn with_timeout(timeout: Duration) -> Self {
        Self {
            timeout,
            concurrency: MAX_CONCURRENT_DOWNLOADS,
        }
    }
}

/// Merge `incoming` into the stored catalog, persist it, then download the
/// remote images of the incoming products.
///
/// # Errors
///
/// Returns `SyncError::Repository` if any incoming record fails validation
/// (nothing is written) or the stored document cannot be read (including
/// when it is corrupt) or written. Download failures are never
/// errors; they are reported per item.
#[instrument(skip_all, fields(incoming = incoming.len()))]
pub async fn sync_catalog<F: ImageFetcher>(
    store: &RecordStore,
    assets: &AssetStore,
    fetcher: &F,
    incoming: Vec<IncomingProduct>,
    settings: DownloadSettings,
) -> Result<SyncReport, SyncError> {
    for item in &incoming {
        item.validate()?;
    }
    let incoming_ids: Vec<ProductId> = incoming.iter().map(|p| p.id).collect();

    let existing = store.load_document::<Product>().await?;
    let (merged, report) = merge(existing, incoming, Utc::now());
    store.products().replace_all(&merged).await?;

    tracing::info!(
        replaced = report.replaced.len(),
        appended = report.appended.len(),
        total = merged.len(),
        "catalog merged"
    );

    let jobs = plan_downloads(&merged, &incoming_ids);
    let images = run_downloads(assets, fetcher, jobs, settings).await;

    Ok(SyncReport {
        merge: report,
        images,
    })
}

struct DownloadJob {
    product_id: ProductId,
    url: String,
}

/// One job per distinct incoming product with an absolute image URL, in merged order.
fn plan_downloads(merged: &[Product], incoming_ids: &[ProductId]) -> Vec<DownloadJob> {
    merged
        .iter()
        .filter(|p| incoming_ids.contains(&p.id) && is_absolute_url(&p.image))
        .map(|p| DownloadJob {
            product_id: p.id,
            url: p.image.clone(),
        })
        .collect()
}

/// Jobs that write the same file, in plan order, with their plan positions.
struct FileGroup {
    name: String,
    jobs: Vec<(usize, DownloadJob)>,
}

async fn run_downloads<F: ImageFetcher>(
    assets: &AssetStore,
    fetcher: &F,
    jobs: Vec<DownloadJob>,
    settings: DownloadSettings,
) -> Vec<ImageOutcome> {
    let total = jobs.len();
    let mut groups: Vec<FileGroup> = Vec::new();
    let mut unnamed: Vec<(usize, ImageOutcome)> = Vec::new();

    for (index, job) in jobs.into_iter().enumerate() {
        let Some(name) = file_name_for(&job.url) else {
            let status = ImageStatus::Failed {
                error: "image URL has no usable file name".to_owned(),
            };
            log_outcome(&job, &status);
            unnamed.push((index, outcome(job, status)));
            continue;
        };
        match groups.iter_mut().find(|g| g.name == name) {
            Some(group) => group.jobs.push((index, job)),
            None => groups.push(FileGroup {
                name,
                jobs: vec![(index, job)],
            }),
        }
    }

    let fetched: Vec<Vec<(usize, ImageOutcome)>> = stream::iter(groups)
        .map(|group| download_group(assets, fetcher, group, settings.timeout))
        .buffered(settings.concurrency.max(1))
        .collect()
        .await;

    let mut outcomes: Vec<Option<ImageOutcome>> = vec![None; total];
    for (index, item) in fetched.into_iter().flatten().chain(unnamed) {
        if let Some(slot) = outcomes.get_mut(index) {
            *slot = Some(item);
        }
    }
    outcomes.into_iter().flatten().collect()
}

/// Download one shared file name. The first job that gets the file onto
/// disk satisfies the rest; a failed URL is not requested twice, but a
/// later job with a different URL still gets its own attempt.
async fn download_group<F: ImageFetcher>(
    assets: &AssetStore,
    fetcher: &F,
    group: FileGroup,
    timeout: Duration,
) -> Vec<(usize, ImageOutcome)> {
    let mut stored: Option<String> = None;
    let mut failed: Vec<(String, String)> = Vec::new();
    let mut results = Vec::with_capacity(group.jobs.len());

    for (index, job) in group.jobs {
        let status = if let Some(path) = &stored {
            ImageStatus::SkippedExisting { path: path.clone() }
        } else if let Some((_, error)) = failed.iter().find(|(url, _)| *url == job.url) {
            ImageStatus::Failed {
                error: error.clone(),
            }
        } else {
            download_one(assets, fetcher, &job.url, &group.name, timeout).await
        };

        match &status {
            ImageStatus::Downloaded { path } | ImageStatus::SkippedExisting { path } => {
                stored = Some(path.clone());
            }
            ImageStatus::Failed { error } => failed.push((job.url.clone(), error.clone())),
        }

        log_outcome(&job, &status);
        results.push((index, outcome(job, status)));
    }
    results
}

fn outcome(job: DownloadJob, status: ImageStatus) -> ImageOutcome {
    ImageOutcome {
        product_id: job.product_id,
        url: job.url,
        status,
    }
}

fn log_outcome(job: &DownloadJob, status: &ImageStatus) {
    match status {
        ImageStatus::Failed { error } => {
            tracing::warn!(
                product_id = %job.product_id,
                url = %job.url,
                %error,
                "image download failed"
            );
        }
        ImageStatus::Downloaded { path } => {
            tracing::info!(product_id = %job.product_id, %path, "image downloaded");
        }
        ImageStatus::SkippedExisting { path } => {
            tracing::debug!(product_id = %job.product_id, %path, "image already present");
        }
    }
}

#[derive(Debug, Error)]
enum DownloadError {
    #[error(transparent)]
    Remote(#[from] RemoteError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

async fn download_one<F: ImageFetcher>(
    assets: &AssetStore,
    fetcher: &F,
    url: &str,
    name: &str,
    timeout: Duration,
) -> ImageStatus {
    match fetch_and_store(assets, fetcher, url, name, timeout).await {
        Ok(status) => status,
        Err(e) => ImageStatus::Failed {
            error: e.to_string(),
        },
    }
}

async fn fetch_and_store<F: ImageFetcher>(
    assets: &AssetStore,
    fetcher: &F,
    url: &str,
    name: &str,
    timeout: Duration,
) -> Result<ImageStatus, DownloadError> {
    if assets.exists(name).await? {
        return Ok(ImageStatus::SkippedExisting {
            path: AssetStore::download_path(name)?,
        });
    }

    let url = Url::parse(url)?;
    let bytes = tokio::time::timeout(timeout, fetcher.fetch(&url))
        .await
        .map_err(|_| RemoteError::TimedOut(timeout))??;
    let path = assets.store_download(name, &bytes).await?;
    Ok(ImageStatus::Downloaded { path })
}

/// Final path segment of an image URL, sanitized to a safe file name.
fn file_name_for(url: &str) -> Option<String> {
    let url = Url::parse(url).ok()?;
    let segment = url.path_segments()?.next_back()?;
    if segment.is_empty() {
        return None;
    }
    sanitize_file_name(segment)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    /// Serves canned bodies; unknown URLs fail, `slow` URLs never finish.
    #[derive(Default)]
    struct FakeFetcher {
        bodies: HashMap<String, Vec<u8>>,
        slow: Vec<String>,
        calls: Mutex<Vec<String>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeFetcher {
        fn with(mut self, url: &str, body: &[u8]) -> Self {
            self.bodies.insert(url.to_owned(), body.to_vec());
            self
        }

        fn slow(mut self, url: &str) -> Self {
            self.slow.push(url.to_owned());
            self
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl ImageFetcher for FakeFetcher {
        async fn fetch(&self, url: &Url) -> Result<Vec<u8>, RemoteError> {
            let url = url.to_string();
            self.calls.lock().unwrap().push(url.clone());

            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;

            if self.slow.contains(&url) {
                return std::future::pending().await;
            }
            let result = self.bodies.get(&url).cloned().ok_or(RemoteError::Status {
                status: 404,
                url: url.clone(),
            });
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            result
        }
    }

    fn stored(id: i64, name: &str) -> Product {
        serde_json::from_value(json!({
            "id": id,
            "name": name,
            "price": 1,
            "createdAt": "2020-01-01T00:00:00Z",
            "slug": slugify(name)
        }))
        .unwrap()
    }

    fn incoming(value: serde_json::Value) -> IncomingProduct {
        serde_json::from_value(value).unwrap()
    }

    fn names(products: &[Product]) -> Vec<&str> {
        products.iter().map(|p| p.name.as_str()).collect()
    }

    fn settings() -> DownloadSettings {
        DownloadSettings::with_timeout(Duration::from_secs(5))
    }

    #[test]
    fn test_merge_replaces_in_place_and_appends() {
        let existing = vec![stored(1, "A"), stored(2, "B")];
        let now = Utc::now();
        let (merged, report) = merge(
            existing,
            vec![
                incoming(json!({"id": 2, "name": "B2", "price": 2})),
                incoming(json!({"id": 3, "name": "C", "price": 3})),
            ],
            now,
        );

        assert_eq!(names(&merged), vec!["A", "B2", "C"]);
        assert_eq!(report.replaced, vec![ProductId::new(2)]);
        assert_eq!(report.appended, vec![ProductId::new(3)]);

        // Replaced record keeps its stored createdAt; appended one gets now.
        assert_eq!(merged[1].created_at.to_rfc3339(), "2020-01-01T00:00:00+00:00");
        assert_eq!(merged[2].created_at, now);
        assert_eq!(merged[1].slug, "b2");
    }

    #[test]
    fn test_merge_with_no_overlap_appends_in_input_order() {
        let (merged, report) = merge(
            vec![stored(1, "A")],
            vec![
                incoming(json!({"id": 9, "name": "Z", "price": 1})),
                incoming(json!({"id": 5, "name": "Y", "price": 1})),
            ],
            Utc::now(),
        );
        assert_eq!(names(&merged), vec!["A", "Z", "Y"]);
        assert!(report.replaced.is_empty());
    }

    #[test]
    fn test_merge_keeps_explicit_slug_and_created_at() {
        let (merged, _) = merge(
            Vec::new(),
            vec![incoming(json!({
                "id": 1, "name": "Name", "price": 1,
                "slug": "Custom Slug", "createdAt": "2019-05-05T00:00:00Z"
            }))],
            Utc::now(),
        );
        assert_eq!(merged[0].slug, "custom-slug");
        assert_eq!(merged[0].created_at.to_rfc3339(), "2019-05-05T00:00:00+00:00");
    }

    #[test]
    fn test_file_name_for() {
        assert_eq!(
            file_name_for("https://cdn.example.com/a/b/cover.png?v=2").as_deref(),
            Some("cover.png")
        );
        assert_eq!(file_name_for("https://cdn.example.com/"), None);
        assert_eq!(
            file_name_for("https://cdn.example.com/my%20cover.png").as_deref(),
            Some("my_20cover.png")
        );
    }

    #[tokio::test]
    async fn test_sync_persists_and_downloads() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data"));
        store.ensure_data_dir().await.unwrap();
        let assets = AssetStore::new(dir.path().join("public"));
        store
            .products()
            .replace_all(&[stored(1, "A"), stored(2, "B")])
            .await
            .unwrap();

        let fetcher = FakeFetcher::default().with("https://cdn.example.com/b2.png", b"b2");
        let report = sync_catalog(
            &store,
            &assets,
            &fetcher,
            vec![
                incoming(json!({"id": 2, "name": "B2", "price": 2,
                                "image": "https://cdn.example.com/b2.png"})),
                incoming(json!({"id": 3, "name": "C", "price": 3, "image": "/local/c.png"})),
            ],
            settings(),
        )
        .await
        .unwrap();

        let listed = store.products().list().await.unwrap();
        assert_eq!(names(&listed), vec!["A", "B2", "C"]);
        // Image URL is left as the remote URL.
        assert_eq!(listed[1].image, "https://cdn.example.com/b2.png");

        assert_eq!(report.images.len(), 1);
        assert_eq!(
            report.images[0].status,
            ImageStatus::Downloaded {
                path: "images/b2.png".to_owned()
            }
        );
        assert_eq!(assets.read("images/b2.png").await.unwrap().bytes, b"b2");
    }

    #[tokio::test]
    async fn test_failed_download_does_not_roll_back_merge() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data"));
        store.ensure_data_dir().await.unwrap();
        let assets = AssetStore::new(dir.path().join("public"));

        let fetcher = FakeFetcher::default()
            .with("https://cdn.example.com/ok.png", b"ok")
            .slow("https://cdn.example.com/hangs.png");
        let report = sync_catalog(
            &store,
            &assets,
            &fetcher,
            vec![
                incoming(json!({"id": 1, "name": "Missing", "price": 1,
                                "image": "https://cdn.example.com/gone.png"})),
                incoming(json!({"id": 2, "name": "Slow", "price": 1,
                                "image": "https://cdn.example.com/hangs.png"})),
                incoming(json!({"id": 3, "name": "Fine", "price": 1,
                                "image": "https://cdn.example.com/ok.png"})),
            ],
            DownloadSettings::with_timeout(Duration::from_millis(100)),
        )
        .await
        .unwrap();

        assert_eq!(store.products().list().await.unwrap().len(), 3);
        assert!(matches!(report.images[0].status, ImageStatus::Failed { .. }));
        assert!(matches!(
            &report.images[1].status,
            ImageStatus::Failed { error } if error.contains("timed out")
        ));
        assert!(matches!(
            report.images[2].status,
            ImageStatus::Downloaded { .. }
        ));
    }

    #[tokio::test]
    async fn test_existing_and_shared_files_are_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data"));
        store.ensure_data_dir().await.unwrap();
        let assets = AssetStore::new(dir.path().join("public"));
        assets.store_download("have.png", b"old").await.unwrap();

        let fetcher = FakeFetcher::default()
            .with("https://a.example.com/have.png", b"new")
            .with("https://a.example.com/shared.png", b"s")
            .with("https://b.example.com/shared.png", b"s");
        let report = sync_catalog(
            &store,
            &assets,
            &fetcher,
            vec![
                incoming(json!({"id": 1, "name": "One", "price": 1,
                                "image": "https://a.example.com/have.png"})),
                incoming(json!({"id": 2, "name": "Two", "price": 1,
                                "image": "https://a.example.com/shared.png"})),
                incoming(json!({"id": 3, "name": "Three", "price": 1,
                                "image": "https://b.example.com/shared.png"})),
            ],
            settings(),
        )
        .await
        .unwrap();

        assert!(matches!(
            report.images[0].status,
            ImageStatus::SkippedExisting { .. }
        ));
        assert!(matches!(
            report.images[1].status,
            ImageStatus::Downloaded { .. }
        ));
        assert!(matches!(
            report.images[2].status,
            ImageStatus::SkippedExisting { .. }
        ));
        assert_eq!(fetcher.calls(), vec!["https://a.example.com/shared.png"]);
        assert_eq!(assets.read("images/have.png").await.unwrap().bytes, b"old");
    }

    #[tokio::test]
    async fn test_shared_name_falls_back_when_first_url_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data"));
        store.ensure_data_dir().await.unwrap();
        let assets = AssetStore::new(dir.path().join("public"));

        // a.example.com is unknown to the fetcher and fails
        let fetcher =
            FakeFetcher::default().with("https://b.example.com/shared.png", b"from-b");
        let report = sync_catalog(
            &store,
            &assets,
            &fetcher,
            vec![
                incoming(json!({"id": 1, "name": "One", "price": 1,
                                "image": "https://a.example.com/shared.png"})),
                incoming(json!({"id": 2, "name": "Two", "price": 1,
                                "image": "https://b.example.com/shared.png"})),
                incoming(json!({"id": 3, "name": "Three", "price": 1,
                                "image": "https://a.example.com/shared.png"})),
            ],
            settings(),
        )
        .await
        .unwrap();

        assert!(matches!(report.images[0].status, ImageStatus::Failed { .. }));
        assert_eq!(
            report.images[1].status,
            ImageStatus::Downloaded {
                path: "images/shared.png".to_owned()
            }
        );
        assert_eq!(
            report.images[2].status,
            ImageStatus::SkippedExisting {
                path: "images/shared.png".to_owned()
            }
        );
        assert_eq!(
            fetcher.calls(),
            vec![
                "https://a.example.com/shared.png",
                "https://b.example.com/shared.png"
            ]
        );
        assert_eq!(assets.read("images/shared.png").await.unwrap().bytes, b"from-b");
    }

    #[tokio::test]
    async fn test_shared_name_failure_is_reported_for_every_product() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data"));
        store.ensure_data_dir().await.unwrap();
        let assets = AssetStore::new(dir.path().join("public"));

        let fetcher = FakeFetcher::default();
        let report = sync_catalog(
            &store,
            &assets,
            &fetcher,
            vec![
                incoming(json!({"id": 1, "name": "One", "price": 1,
                                "image": "https://a.example.com/gone.png"})),
                incoming(json!({"id": 2, "name": "Two", "price": 1,
                                "image": "https://a.example.com/gone.png"})),
            ],
            settings(),
        )
        .await
        .unwrap();

        assert!(matches!(report.images[0].status, ImageStatus::Failed { .. }));
        assert!(matches!(report.images[1].status, ImageStatus::Failed { .. }));
        // The same failing URL is requested once
        assert_eq!(fetcher.calls().len(), 1);
        assert!(!assets.exists("gone.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_invalid_incoming_rejects_whole_batch() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data"));
        store.ensure_data_dir().await.unwrap();
        let assets = AssetStore::new(dir.path().join("public"));
        store.products().replace_all(&[stored(1, "A")]).await.unwrap();

        for bad in [
            json!({"id": 2, "name": "Neg", "price": -5}),
            json!({"id": 2, "name": "  ", "price": 1}),
        ] {
            let result = sync_catalog(
                &store,
                &assets,
                &FakeFetcher::default(),
                vec![
                    incoming(json!({"id": 1, "name": "A2", "price": 1})),
                    incoming(bad),
                ],
                settings(),
            )
            .await;

            assert!(matches!(
                result,
                Err(SyncError::Repository(RepositoryError::Validation(msg)))
                    if msg.contains("product 2")
            ));
            assert_eq!(names(&store.products().list().await.unwrap()), vec!["A"]);
        }
    }

    #[tokio::test]
    async fn test_downloads_are_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("data"));
        store.ensure_data_dir().await.unwrap();
        let assets = AssetStore::new(dir.path().join("public"));

        let mut fetcher = FakeFetcher::default();
        let mut items = Vec::new();
        for id in 1..=10 {
            let url = format!("https://cdn.example.com/{id}.png");
            fetcher = fetcher.with(&url, b"x");
            items.push(incoming(json!({
                "id": id, "name": format!("P{id}"), "price": 1, "image": url
            })));
        }

        let settings = DownloadSettings {
            timeout: Duration::from_secs(5),
            concurrency: 2,
        };
        let report = sync_catalog(&store, &assets, &fetcher, items, settings)
            .await
            .unwrap();

        assert_eq!(report.images.len(), 10);
        assert!(fetcher.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn test_corrupt_document_aborts_before_writing() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        let assets = AssetStore::new(dir.path().join("public"));
        tokio::fs::write(store.document_path::<Product>(), b"oops")
            .await
            .unwrap();

        let result = sync_catalog(
            &store,
            &assets,
            &FakeFetcher::default(),
            vec![incoming(json!({"id": 1, "name": "A", "price": 1}))],
            settings(),
        )
        .await;

        assert!(matches!(
            result,
            Err(SyncError::Repository(RepositoryError::Corrupt { .. }))
        ));
        assert_eq!(
            tokio::fs::read(store.document_path::<Product>()).await.unwrap(),
            b"oops"
        );
    }
}
