//! Folder HTTP handlers.
//!
//! Folder deletion owns one direction of the cascade: the deleted folder's
//! id is stripped from every note that referenced it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::debug;

use grimoire_core::{parse_id, Folder, FolderStore, NoteStore};

use crate::auth::AuthUser;
use crate::{ApiError, AppState};

/// Body for folder create/rename.
#[derive(Debug, Deserialize)]
pub struct UpsertFolderRequest {
    #[serde(default)]
    pub name: Option<String>,
}

fn require_name(req: &UpsertFolderRequest) -> Result<String, ApiError> {
    match req.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ApiError::BadRequest(
            "Missing `name` in request body".to_string(),
        )),
    }
}

/// List the caller's folders, name order.
pub async fn list_folders(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Folder>>, ApiError> {
    Ok(Json(state.db.folders.list(auth.user_id).await?))
}

/// Fetch one of the caller's folders.
pub async fn get_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Folder>, ApiError> {
    let id = parse_id(&id)?;

    let folder = state
        .db
        .folders
        .find_by_id(id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Folder {} not found", id)))?;

    Ok(Json(folder))
}

/// Create a folder. A `(name, owner)` collision is a 400, not a raw
/// database error.
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpsertFolderRequest>,
) -> Result<(StatusCode, Json<Folder>), ApiError> {
    let name = require_name(&req)?;
    let folder = state.db.folders.create(auth.user_id, &name).await?;
    Ok((StatusCode::CREATED, Json(folder)))
}

/// Rename a folder.
pub async fn update_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpsertFolderRequest>,
) -> Result<Json<Folder>, ApiError> {
    let id = parse_id(&id)?;
    let name = require_name(&req)?;

    let folder = state
        .db
        .folders
        .rename(id, auth.user_id, &name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Folder {} not found", id)))?;

    Ok(Json(folder))
}

/// Delete a folder and clear its reference from every affected note.
/// 204 even when zero notes referenced it.
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    if !state.db.folders.delete(id, auth.user_id).await? {
        return Err(ApiError::NotFound(format!("Folder {} not found", id)));
    }

    let cleared = state.db.notes.remove_folder_ref(id, auth.user_id).await?;
    debug!(
        subsystem = "api",
        op = "cascade",
        folder_id = %id,
        result_count = cleared,
        "cleared folder reference from notes"
    );

    Ok(StatusCode::NO_CONTENT)
}
