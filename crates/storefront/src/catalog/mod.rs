//! Read-side catalog: products joined with their owners, plus filtering.
//!
//! Owners are resolved from a user index built once per request rather than
//! by scanning the user list for every product.

pub mod sync;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use bazaar_core::UserId;

use crate::models::{Product, User};

/// Owner of a product as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Owner {
    /// The product has no `userId`.
    None,
    /// The referenced user exists.
    Resolved {
        id: UserId,
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        image: Option<String>,
    },
    /// The product references a user that does not exist.
    Unresolved { id: UserId },
}

/// A product with its owner attached.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub owner: Owner,
}

/// Users keyed by id. Duplicate ids resolve to the first record.
pub struct OwnerIndex<'a> {
    users: HashMap<UserId, &'a User>,
}

impl<'a> OwnerIndex<'a> {
    /// Build the index from a user list.
    #[must_use]
    pub fn new(users: &'a [User]) -> Self {
        let mut index = HashMap::with_capacity(users.len());
        for user in users {
            index.entry(user.id).or_insert(user);
        }
        Self { users: index }
    }

    /// Resolve an optional owner reference.
    #[must_use]
    pub fn resolve(&self, user_id: Option<UserId>) -> Owner {
        let Some(id) = user_id else {
            return Owner::None;
        };
        match self.users.get(&id) {
            Some(user) => Owner::Resolved {
                id,
                name: user.name.clone(),
                image: user.image.clone(),
            },
            None => Owner::Unresolved { id },
        }
    }

    /// Attach the owner to one product.
    #[must_use]
    pub fn join(&self, product: Product) -> ProductView {
        let owner = self.resolve(product.user_id);
        ProductView { product, owner }
    }
}

/// Join every product with its owner, keeping product order.
#[must_use]
pub fn join_products(products: Vec<Product>, users: &[User]) -> Vec<ProductView> {
    let index = OwnerIndex::new(users);
    products.into_iter().map(|p| index.join(p)).collect()
}

/// Query-string filters for the public product listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CatalogFilter {
    pub category: Option<String>,
    pub tag: Option<String>,
    pub q: Option<String>,
}

impl CatalogFilter {
    /// Whether a product passes every filter that is set.
    ///
    /// Category and tag comparisons are case-insensitive exact matches.
    #[must_use]
    pub fn matches(&self, product: &Product) -> bool {
        if let Some(category) = non_empty(self.category.as_deref())
            && !product.category.eq_ignore_ascii_case(category)
        {
            return false;
        }
        if let Some(tag) = non_empty(self.tag.as_deref())
            && !product.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
        {
            return false;
        }
        match non_empty(self.q.as_deref()) {
            Some(q) => product.matches_query(q),
            None => true,
        }
    }

    /// Keep the matching products, in order.
    #[must_use]
    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        products.into_iter().filter(|p| self.matches(p)).collect()
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Distinct non-empty categories in first-seen order.
#[must_use]
pub fn categories(products: &[Product]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    for product in products {
        let category = product.category.trim();
        if !category.is_empty() && !seen.iter().any(|c| c == category) {
            seen.push(category.to_owned());
        }
    }
    seen
}
