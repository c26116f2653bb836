//! Asset serving.

use axum::{
    extract::{Path, State},
    http::header::{CACHE_CONTROL, CONTENT_TYPE},
    response::IntoResponse,
};

use crate::error::Result;
use crate::state::AppState;

/// Serve a stored file.
///
/// GET /assets/{*path}
///
/// # Errors
///
/// Returns 404 for missing files and 403 for paths outside the asset root.
pub async fn serve(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<impl IntoResponse> {
    let asset = state.assets().read(&path).await?;
    Ok((
        [
            (CONTENT_TYPE, asset.content_type),
            (CACHE_CONTROL, "public, max-age=3600"),
        ],
        asset.bytes,
    ))
}
