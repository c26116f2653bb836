//! Admin image uploads.

use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};
use serde::Serialize;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::services::assets::upload_stem;
use crate::state::AppState;

/// Largest accepted upload body.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Where an upload was stored.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Path relative to the asset root.
    pub path: String,
    /// URL the file is served from.
    pub url: String,
}

/// Store an image from a multipart form.
///
/// POST /api/admin/uploads
///
/// Fields: `file` (required, an image) and `name` (optional base name, used
/// as given; defaults to the uploaded file name without its extension).
///
/// # Errors
///
/// Returns 400 if the form is malformed, `file` is missing or the content
/// type is not an accepted image type.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>)> {
    let mut file: Option<(Vec<u8>, String, String)> = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        match field.name() {
            Some("file") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                file = Some((bytes.to_vec(), content_type, file_name));
            }
            Some("name") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                name = Some(text).filter(|n| !n.trim().is_empty());
            }
            _ => {}
        }
    }

    let (bytes, content_type, file_name) =
        file.ok_or_else(|| AppError::BadRequest("missing 'file' field".to_string()))?;
    // An explicit name is used as given; a client file name loses its extension
    let base_name = name.unwrap_or_else(|| upload_stem(&file_name).to_owned());

    let path = state
        .assets()
        .store_upload(&bytes, &base_name, &content_type)
        .await?;
    let url = format!("/assets/{path}");
    Ok((StatusCode::CREATED, Json(UploadResponse { path, url })))
}
