//! Product repository over `products.json`.

use chrono::Utc;
use tracing::instrument;

use bazaar_core::ProductId;

use super::{Record, RecordStore, RepositoryError};
use crate::models::{NewProduct, Product, ProductPatch};

impl Record for Product {
    type Id = ProductId;

    const COLLECTION: &'static str = "products";
    const FILE_NAME: &'static str = "products.json";

    fn id(&self) -> ProductId {
        self.id
    }
}

/// Repository for product records.
pub struct ProductRepository<'a> {
    store: &'a RecordStore,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(store: &'a RecordStore) -> Self {
        Self { store }
    }

    /// All products in document order. Missing or corrupt document → empty.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` for I/O failures other than a missing file.
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        self.store.list().await
    }

    /// Find a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Storage` for I/O failures.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }

    /// Find the first product (in document order) with this slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for an empty slug and
    /// `RepositoryError::Storage` for I/O failures.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Product>, RepositoryError> {
        if slug.trim().is_empty() {
            return Err(RepositoryError::Validation("slug is required".to_owned()));
        }
        Ok(self.list().await?.into_iter().find(|p| p.slug == slug))
    }

    /// Create a product with the next id, the current time and a slug derived from its name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for invalid input, and
    /// `RepositoryError::Storage`/`Corrupt` if the document cannot be
    /// read or written.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        new.validate()?;

        let mut products = self.store.load_document::<Product>().await?;
        let id = Product::next_id(&products)?;
        let product = new.into_product(id, Utc::now());
        products.push(product.clone());
        self.store.save_document(&products).await?;

        tracing::info!(id = %product.id, slug = %product.slug, "product created");
        Ok(product)
    }

    /// Apply a patch to an existing product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id,
    /// `RepositoryError::Validation` for invalid input, and storage errors
    /// if the document cannot be read or written.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: ProductId,
        patch: ProductPatch,
    ) -> Result<Product, RepositoryError> {
        patch.validate()?;
        if patch.touches_protected_fields() {
            tracing::debug!(%id, "ignoring protected fields in product patch");
        }

        let mut products = self.store.load_document::<Product>().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(RepositoryError::NotFound)?;
        patch.apply(product);
        let updated = product.clone();
        self.store.save_document(&products).await?;

        tracing::info!(%id, "product updated");
        Ok(updated)
    }

    /// Remove a product. Succeeds whether or not it existed; returns
    /// whether a record was removed.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the document cannot be read or written.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let mut products = self.store.load_document::<Product>().await?;
        let before = products.len();
        products.retain(|p| p.id != id);
        let removed = products.len() != before;
        self.store.save_document(&products).await?;

        tracing::info!(%id, removed, "product delete");
        Ok(removed)
    }

    /// Replace the whole product document.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the document cannot be written.
    pub async fn replace_all(&self, products: &[Product]) -> Result<(), RepositoryError> {
        self.store.save_document(products).await
    }
}
