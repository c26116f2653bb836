//! Filesystem asset storage.
//!
//! All paths are relative to a single root directory. Reads canonicalize the
//! requested path and refuse anything that resolves outside the root,
//! including symlinks that point elsewhere.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

use bazaar_core::slugify;

/// Subdirectory for admin uploads.
pub const UPLOAD_DIR: &str = "uploads";

/// Subdirectory for images fetched by catalog sync.
pub const DOWNLOAD_DIR: &str = "images";

/// Errors from the asset store.
#[derive(Debug, Error)]
pub enum AssetError {
    /// No file at that path.
    #[error("asset not found")]
    NotFound,

    /// The path resolves outside the asset root.
    #[error("path escapes asset root")]
    Forbidden,

    /// A file name could not be reduced to a safe single segment.
    #[error("invalid file name: {0}")]
    InvalidName(String),

    /// Upload content type is not an accepted image type.
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    /// Filesystem failure.
    #[error("asset storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// A stored file and its content type.
#[derive(Debug, Clone)]
pub struct Asset {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
}

/// Handle to the asset root directory.
#[derive(Debug, Clone)]
pub struct AssetStore {
    root: PathBuf,
}

impl AssetStore {
    /// Create a store rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The asset root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the root and its upload/download subdirectories.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::Io` if a directory cannot be created.
    pub async fn ensure_dirs(&self) -> Result<(), AssetError> {
        tokio::fs::create_dir_all(self.root.join(UPLOAD_DIR)).await?;
        tokio::fs::create_dir_all(self.root.join(DOWNLOAD_DIR)).await?;
        Ok(())
    }

    /// Resolve a request path to a file inside the root.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::Forbidden` if the path resolves outside the root
    /// and `AssetError::NotFound` if nothing exists there.
    pub async fn resolve(&self, relative: &str) -> Result<PathBuf, AssetError> {
        let relative = relative.trim_start_matches('/');
        if relative.is_empty() {
            return Err(AssetError::NotFound);
        }

        let root = canonicalize(&self.root).await?;
        let candidate = canonicalize(&self.root.join(relative)).await?;

        if !candidate.starts_with(&root) {
            tracing::warn!(path = relative, "asset path escapes root");
            return Err(AssetError::Forbidden);
        }
        if !tokio::fs::metadata(&candidate).await?.is_file() {
            return Err(AssetError::NotFound);
        }
        Ok(candidate)
    }

    /// Read a file and derive its content type from the extension.
    ///
    /// # Errors
    ///
    /// See [`AssetStore::resolve`]; also `AssetError::Io` on read failure.
    pub async fn read(&self, relative: &str) -> Result<Asset, AssetError> {
        let path = self.resolve(relative).await?;
        let bytes = tokio::fs::read(&path).await?;
        Ok(Asset {
            bytes,
            content_type: content_type_for(&path),
        })
    }

    /// Store an uploaded image as `uploads/<slug>-<timestamp>.<ext>` and
    /// return that relative path. `base_name` is slugified whole, dots
    /// included; see [`upload_stem`] for client file names. Bytes are
    /// written unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::UnsupportedType` for non-image content types and
    /// `AssetError::Io` if the file cannot be written.
    pub async fn store_upload(
        &self,
        bytes: &[u8],
        base_name: &str,
        content_type: &str,
    ) -> Result<String, AssetError> {
        let extension = image_extension(content_type)
            .ok_or_else(|| AssetError::UnsupportedType(content_type.to_owned()))?;

        let stem = Some(slugify(base_name))
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "upload".to_owned());
        let file_name = format!(
            "{stem}-{}.{extension}",
            Utc::now().timestamp_millis()
        );

        tokio::fs::create_dir_all(self.root.join(UPLOAD_DIR)).await?;
        let relative = format!("{UPLOAD_DIR}/{file_name}");
        tokio::fs::write(self.root.join(&relative), bytes).await?;

        tracing::info!(path = %relative, size = bytes.len(), "upload stored");
        Ok(relative)
    }

    /// Relative path a downloaded file with this name is stored under.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidName` if the name is not a usable single segment.
    pub fn download_path(file_name: &str) -> Result<String, AssetError> {
        let name = sanitize_file_name(file_name)
            .ok_or_else(|| AssetError::InvalidName(file_name.to_owned()))?;
        Ok(format!("{DOWNLOAD_DIR}/{name}"))
    }

    /// Whether a downloaded file with this name is already stored.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidName` for unusable names.
    pub async fn exists(&self, file_name: &str) -> Result<bool, AssetError> {
        let relative = Self::download_path(file_name)?;
        Ok(tokio::fs::try_exists(self.root.join(relative)).await?)
    }

    /// Write downloaded bytes under the downloads directory and return the
    /// relative path.
    ///
    /// # Errors
    ///
    /// Returns `AssetError::InvalidName` for unusable names and
    /// `AssetError::Io` if the file cannot be written.
    pub async fn store_download(
        &self,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, AssetError> {
        let relative = Self::download_path(file_name)?;
        tokio::fs::create_dir_all(self.root.join(DOWNLOAD_DIR)).await?;
        tokio::fs::write(self.root.join(&relative), bytes).await?;
        Ok(relative)
    }
}

async fn canonicalize(path: &Path) -> Result<PathBuf, AssetError> {
    match tokio::fs::canonicalize(path).await {
        Ok(path) => Ok(path),
        Err(e) if e.kind() == ErrorKind::NotFound => Err(AssetError::NotFound),
        Err(e) => Err(e.into()),
    }
}

/// Reduce a name to one safe path segment: no separators, no `.`/`..`,
/// no leading dot, only `[A-Za-z0-9._-]`.
#[must_use]
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let last = Path::new(name).components().next_back()?;
    let Component::Normal(segment) = last else {
        return None;
    };
    let cleaned: String = segment
        .to_string_lossy()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_owned())
    }
}

/// Base name for an upload taken from the client's file name: the final
/// path segment without its extension.
#[must_use]
pub fn upload_stem(file_name: &str) -> &str {
    Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
}

/// Content type for a file by extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("pdf") => "application/pdf",
        Some("zip") => "application/zip",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        _ => "application/octet-stream",
    }
}

/// File extension for an accepted image upload type.
#[must_use]
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/svg+xml" => Some("svg"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}
