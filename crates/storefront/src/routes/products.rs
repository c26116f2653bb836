//! Public catalog route handlers.

use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{PathRejection, QueryRejection},
    },
};

use crate::catalog::{self, CatalogFilter, OwnerIndex, ProductView};
use crate::error::{AppError, Result};
use crate::models::{Product, User};
use crate::state::AppState;

/// List products with their owners, optionally filtered.
///
/// GET /api/products?category=&tag=&q=
///
/// # Errors
///
/// Returns 400 for malformed query strings and 500 on storage failure.
pub async fn index(
    State(state): State<AppState>,
    filter: std::result::Result<Query<CatalogFilter>, QueryRejection>,
) -> Result<Json<Vec<ProductView>>> {
    let Query(filter) = filter?;
    let products = filter.apply(state.records().list::<Product>().await?);
    let users = state.records().list::<User>().await?;
    Ok(Json(catalog::join_products(products, &users)))
}

/// Product detail by slug.
///
/// GET /api/products/{slug}
///
/// # Errors
///
/// Returns 404 if no product has this slug and 400 for a blank slug.
pub async fn show(
    State(state): State<AppState>,
    slug: std::result::Result<Path<String>, PathRejection>,
) -> Result<Json<ProductView>> {
    let Path(slug) = slug?;
    let product = state
        .records()
        .products()
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("product '{slug}'")))?;

    let users = state.records().list::<User>().await?;
    Ok(Json(OwnerIndex::new(&users).join(product)))
}

/// Distinct categories in catalog order.
///
/// GET /api/categories
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn categories(State(state): State<AppState>) -> Result<Json<Vec<String>>> {
    let products = state.records().list::<Product>().await?;
    Ok(Json(catalog::categories(&products)))
}
