//! Admin user management.

use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use bazaar_core::UserId;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::{NewUser, User, UserPatch};
use crate::state::AppState;

type JsonBody<T> = std::result::Result<Json<T>, JsonRejection>;
type IdPath = std::result::Result<Path<UserId>, PathRejection>;

/// GET /api/admin/users
///
/// # Errors
///
/// Returns 500 on storage failure.
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.records().users().list().await?))
}

/// POST /api/admin/users
///
/// # Errors
///
/// Returns 400 for a blank name or invalid email.
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    payload: JsonBody<NewUser>,
) -> Result<(StatusCode, Json<User>)> {
    let Json(new) = payload?;
    let user = state.records().users().create(new).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/admin/users/{id}
///
/// # Errors
///
/// Returns 404 if the user does not exist.
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: IdPath,
) -> Result<Json<User>> {
    let Path(id) = id?;
    state
        .records()
        .users()
        .get_by_id(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("user {id}")))
}

/// PATCH /api/admin/users/{id}
///
/// # Errors
///
/// Returns 404 if the user does not exist and 400 for invalid input.
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    id: IdPath,
    payload: JsonBody<UserPatch>,
) -> Result<Json<User>> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    Ok(Json(state.records().users().update(id, patch).await?))
}

/// DELETE /api/admin/users/{id}
///
/// Products owned by the user keep their `userId` and show an unresolved owner.
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
    state.records().users().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
