//! Admin product management.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use bazaar_core::ProductId;

use crate::catalog::sync::{IncomingProduct, SyncReport, sync_catalog};
use crate::catalog::{self, ProductView};
use crate::error::{AppError, Result, add_breadcrumb};
use crate::middleware::RequireAdmin;
use crate::models::{NewProduct, Product, ProductPatch, User};
use crate::state::AppState;

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type IdPath = std::result::Result<Path<ProductId>, PathRejection>;

/// All products with owners.
///
/// GET /api/admin/products
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<ProductView>>> {
    let products = state.records().list::<Product>().await?;
    let users = state.records().list::<User>().await?;
    Ok(Json(catalog::join_products(products, &users)))
}

/// Create a product.
///
/// POST /api/admin/products
///
/// # Errors
///
/// Returns 400 for invalid input and 500 on storage failure.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: JsonBody<NewProduct>,
) -> Result<(StatusCode, Json<Product>)> {
    let Json(new) = payload?;
    let product = state.records().products().create(new).await?;
    tracing::info!(admin = admin.id, id = %product.id, "admin created product");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Product by id.
///
/// GET /api/admin/products/{id}
///
/// # Errors
///
/// Returns 404 if the product does not exist.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: IdPath,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    state
        .records()
        .products()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("product {id}")))
}

/// Apply a partial update.
///
/// PATCH /api/admin/products/{id}
///
/// # Errors
///
/// Returns 404 if the product does not exist and 400 for invalid input.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: IdPath,
    payload: JsonBody<ProductPatch>,
) -> Result<Json<Product>> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    let product = state.records().products().update(id, patch).await?;
    Ok(Json(product))
}

/// Delete a product. Deleting a missing id also succeeds.
///
/// DELETE /api/admin/products/{id}
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: IdPath,
) -> Result<StatusCode> {
    let Path(id) = id?;
    state.records().products().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Merge an external product list into the catalog and fetch remote images.
///
/// POST /api/admin/products/sync
///
/// # Errors
///
/// Returns 400 for a malformed body and 500 if the catalog cannot be read
/// or written. Image download failures are reported in the body, not as errors.
pub async fn sync(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    payload: JsonBody<Vec<IncomingProduct>>,
) -> Result<Json<SyncReport>> {
    let Json(incoming) = payload?;
    let count = incoming.len().to_string();
    add_breadcrumb("catalog", "sync requested", Some(&[("incoming", &count)]));
    tracing::info!(admin = admin.id, incoming = incoming.len(), "catalog sync requested");

    let report = sync_catalog(
        state.records(),
        state.assets(),
        state.fetcher(),
        incoming,
        state.download_settings(),
    )
    .await?;
    Ok(Json(report))
}
