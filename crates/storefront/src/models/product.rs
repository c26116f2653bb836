//! Product records and the request types that create or change them.

use chrono::{DateTime, Utc};
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};

use bazaar_core::{Price, ProductId, UserId, slugify};

use crate::db::RepositoryError;

/// A catalog product as persisted in `products.json`.
///
/// `slug` is derived from `name` when the product is created and is not
/// recomputed when the product is renamed, so a renamed product keeps its
/// original URL unless the slug is patched explicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
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
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desktop_image: Option<String>,
    /// Owning user record. Not enforced: the user may not exist.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub slug: String,
}

impl Product {
    /// Whether `image` points at a remote http(s) location.
    #[must_use]
    pub fn has_remote_image(&self) -> bool {
        is_absolute_url(&self.image)
    }

    /// Case-insensitive match against name, description, category and tags.
    #[must_use]
    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle)
            || self.description.to_lowercase().contains(&needle)
            || self.category.to_lowercase().contains(&needle)
            || self.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }
}

/// Returns true for `http://` and `https://` URLs with a host.
#[must_use]
pub fn is_absolute_url(value: &str) -> bool {
    url::Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}

/// Fields accepted when creating a product.
///
/// `id`, `createdAt` and `slug` are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewProduct {
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
}

impl NewProduct {
    /// Check required fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if the name is blank or the price is negative.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        validate_name(&self.name)?;
        validate_price(self.price)
    }

    /// Build the stored record.
    #[must_use]
    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        let name = self.name.trim().to_owned();
        let slug = slugify(&name);
        Product {
            id,
            name,
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

/// Partial update for a product.
///
/// Only the fields listed here can change. `id`, `createdAt` and `userId`
/// are accepted so that a client echoing a full record back does not fail,
/// but their values are discarded. Any other field is rejected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Price>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub highlights: Option<Vec<String>>,
    pub format: Option<String>,
    pub storage: Option<String>,
    pub image: Option<String>,
    /// Empty string clears the field.
    pub mobile_image: Option<String>,
    /// Empty string clears the field.
    pub desktop_image: Option<String>,
    /// Explicit slug change. Renaming alone never touches the slug.
    pub slug: Option<String>,

    #[serde(rename = "id")]
    ignored_id: Option<IgnoredAny>,
    #[serde(rename = "createdAt")]
    ignored_created_at: Option<IgnoredAny>,
    #[serde(rename = "userId")]
    ignored_user_id: Option<IgnoredAny>,
}

impl ProductPatch {
    /// Check the fields that are present.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for a blank name, a negative
    /// price, or a slug that normalizes to nothing.
    pub fn validate(&self) -> Result<(), RepositoryError> {
        if let Some(name) = &self.name {
            validate_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        if let Some(slug) = &self.slug
            && slugify(slug).is_empty()
        {
            return Err(RepositoryError::Validation(
                "slug must contain letters or digits".to_owned(),
            ));
        }
        Ok(())
    }

    /// Whether the client tried to set a protected field.
    #[must_use]
    pub const fn touches_protected_fields(&self) -> bool {
        self.ignored_id.is_some()
            || self.ignored_created_at.is_some()
            || self.ignored_user_id.is_some()
    }

    /// Apply the patch in place. `id`, `created_at` and `user_id` are never written.
    pub fn apply(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name.trim().to_owned();
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(tags) = self.tags {
            product.tags = tags;
        }
        if let Some(highlights) = self.highlights {
            product.highlights = highlights;
        }
        if let Some(format) = self.format {
            product.format = format;
        }
        if let Some(storage) = self.storage {
            product.storage = storage;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(mobile) = self.mobile_image {
            product.mobile_image = Some(mobile).filter(|s| !s.is_empty());
        }
        if let Some(desktop) = self.desktop_image {
            product.desktop_image = Some(desktop).filter(|s| !s.is_empty());
        }
        if let Some(slug) = self.slug {
            product.slug = slugify(&slug);
        }
    }
}

pub(crate) fn validate_name(name: &str) -> Result<(), RepositoryError> {
    if name.trim().is_empty() {
        return Err(RepositoryError::Validation("name is required".to_owned()));
    }
    Ok(())
}

pub(crate) fn validate_price(price: Price) -> Result<(), RepositoryError> {
    Price::try_new(price.amount())
        .map(|_| ())
        .map_err(|e| RepositoryError::Validation(e.to_string()))
}
