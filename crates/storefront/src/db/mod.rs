//! File-backed record store.
//!
//! # Documents
//!
//! Two whole-file JSON documents live in the data directory:
//!
//! - `products.json` - `{ "products": [Product, ...] }`
//! - `users.json` - `{ "users": [User, ...] }`
//!
//! Every mutation re-reads the document, changes it in memory and rewrites
//! the entire file (pretty-printed UTF-8). There is no cache, no locking and
//! no atomic rename: two concurrent writers to the same document race and the
//! last write wins, silently discarding the other update. A crash mid-write
//! can truncate the file.
//!
//! # Reads vs. writes
//!
//! [`RecordStore::list`] treats a missing or unparseable document as empty so
//! read paths keep working. Mutation paths use [`RecordStore::load_document`],
//! which still treats a missing file as empty but refuses to overwrite a
//! document it cannot parse.

pub mod products;
pub mod users;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

pub use products::ProductRepository;
pub use users::UserRepository;

/// Errors from the record store.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Reading or writing a document failed.
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// A document exists but is not valid JSON for its collection.
    #[error("corrupt document {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Serializing a document failed.
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    /// Requested record was not found.
    #[error("not found")]
    NotFound,

    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),
}

/// A record kind persisted as one JSON document.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync {
    /// Numeric id type of this record.
    type Id: Copy + Eq + Ord + From<i64> + Into<i64> + std::fmt::Display + Send;

    /// Top-level key of the document (`{"<collection>": [...]}`).
    const COLLECTION: &'static str;

    /// File name inside the data directory.
    const FILE_NAME: &'static str;

    /// This record's id.
    fn id(&self) -> Self::Id;

    /// `max(existing ids ∪ {0}) + 1`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the largest stored id is
    /// `i64::MAX`, so no larger id exists.
    fn next_id(records: &[Self]) -> Result<Self::Id, RepositoryError> {
        let max = records
            .iter()
            .map(|r| -> i64 { r.id().into() })
            .max()
            .unwrap_or(0);
        max.checked_add(1).map(Self::Id::from).ok_or_else(|| {
            RepositoryError::Validation(format!("{} ids exhausted", Self::COLLECTION))
        })
    }
}

/// Handle to the data directory holding the JSON documents.
///
/// Cheap to clone; holds no in-memory copy of the data.
#[derive(Debug, Clone)]
pub struct RecordStore {
    data_dir: PathBuf,
}

impl RecordStore {
    /// Create a store rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// The data directory.
    #[must_use]
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Create the data directory if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` if the directory cannot be created.
    pub async fn ensure_data_dir(&self) -> Result<(), RepositoryError> {
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    /// Product repository backed by this store.
    #[must_use]
    pub const fn products(&self) -> ProductRepository<'_> {
        ProductRepository::new(self)
    }

    /// User repository backed by this store.
    #[must_use]
    pub const fn users(&self) -> UserRepository<'_> {
        UserRepository::new(self)
    }

    /// Path of the document for `R`.
    #[must_use]
    pub fn document_path<R: Record>(&self) -> PathBuf {
        self.data_dir.join(R::FILE_NAME)
    }

    /// All records of kind `R`, tolerating a missing or corrupt document.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` only for I/O failures other than a
    /// missing file (e.g. permission denied).
    pub async fn list<R: Record>(&self) -> Result<Vec<R>, RepositoryError> {
        match self.load_document::<R>().await {
            Ok(records) => Ok(records),
            Err(RepositoryError::Corrupt { path, source }) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %source,
                    "unreadable document, treating as empty"
                );
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Read the document for `R`. A missing file is an empty collection.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` on I/O failure and
    /// `RepositoryError::Corrupt` if the file cannot be parsed.
    pub async fn load_document<R: Record>(&self) -> Result<Vec<R>, RepositoryError> {
        let path = self.document_path::<R>();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        parse_document::<R>(&bytes).map_err(|source| RepositoryError::Corrupt { path, source })
    }

    /// Rewrite the whole document for `R`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Encode` if serialization fails or
    /// `RepositoryError::Storage` if the write fails.
    pub async fn save_document<R: Record>(&self, records: &[R]) -> Result<(), RepositoryError> {
        let bytes = encode_document(records).map_err(RepositoryError::Encode)?;
        tokio::fs::write(self.document_path::<R>(), bytes).await?;
        Ok(())
    }
}

/// Parse `{"<collection>": [...]}`. Other top-level keys are ignored.
fn parse_document<R: Record>(bytes: &[u8]) -> Result<Vec<R>, serde_json::Error> {
    let mut document: serde_json::Map<String, serde_json::Value> = serde_json::from_slice(bytes)?;
    match document.remove(R::COLLECTION) {
        Some(value) => serde_json::from_value(value),
        None => Ok(Vec::new()),
    }
}

fn encode_document<R: Record>(records: &[R]) -> Result<Vec<u8>, serde_json::Error> {
    let mut document = serde_json::Map::new();
    document.insert(R::COLLECTION.to_owned(), serde_json::to_value(records)?);
    let mut bytes = serde_json::to_vec_pretty(&serde_json::Value::Object(document))?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::{Product, User};

    #[tokio::test]
    async fn test_missing_document_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());

        assert!(store.list::<Product>().await.unwrap().is_empty());
        assert!(store.load_document::<User>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_corrupt_document_lists_empty_but_blocks_writes() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        tokio::fs::write(store.document_path::<Product>(), b"{ not json")
            .await
            .unwrap();

        assert!(store.list::<Product>().await.unwrap().is_empty());
        assert!(matches!(
            store.load_document::<Product>().await,
            Err(RepositoryError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn test_document_shape() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        store.save_document::<User>(&[]).await.unwrap();

        let text = tokio::fs::read_to_string(store.document_path::<User>())
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value, serde_json::json!({ "users": [] }));
        // Pretty-printed
        assert!(text.contains('\n'));
    }

    #[tokio::test]
    async fn test_document_without_collection_key_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path());
        tokio::fs::write(store.document_path::<User>(), b"{\"other\": 1}")
            .await
            .unwrap();

        assert!(store.load_document::<User>().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_ensure_data_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let store = RecordStore::new(dir.path().join("a/b"));
        store.ensure_data_dir().await.unwrap();
        assert!(store.data_dir().is_dir());
    }
}
