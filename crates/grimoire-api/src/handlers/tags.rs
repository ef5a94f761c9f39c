//! Tag HTTP handlers.
//!
//! Tag deletion owns the other direction of the cascade: the deleted tag's
//! id is pulled from every note that carried it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::debug;

use grimoire_core::{parse_id, NoteStore, Tag, TagStore};

use crate::auth::AuthUser;
use crate::{ApiError, AppState};

/// Body for tag create/rename.
#[derive(Debug, Deserialize)]
pub struct UpsertTagRequest {
    #[serde(default)]
    pub name: Option<String>,
}

fn require_name(req: &UpsertTagRequest) -> Result<String, ApiError> {
    match req.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ApiError::BadRequest(
            "Missing `name` in request body".to_string(),
        )),
    }
}

/// List the caller's tags, name order.
pub async fn list_tags(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.db.tags.list(auth.user_id).await?))
}

/// Fetch one of the caller's tags.
pub async fn get_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Tag>, ApiError> {
    let id = parse_id(&id)?;

    let tag = state
        .db
        .tags
        .find_by_id(id, auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tag {} not found", id)))?;

    Ok(Json(tag))
}

/// Create a tag. A `(name, owner)` collision is a 400, not a raw database
/// error.
pub async fn create_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<UpsertTagRequest>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let name = require_name(&req)?;
    let tag = state.db.tags.create(auth.user_id, &name).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Rename a tag.
pub async fn update_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpsertTagRequest>,
) -> Result<Json<Tag>, ApiError> {
    let id = parse_id(&id)?;
    let name = require_name(&req)?;

    let tag = state
        .db
        .tags
        .rename(id, auth.user_id, &name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Tag {} not found", id)))?;

    Ok(Json(tag))
}

/// Delete a tag and pull its id from every note that carried it.
pub async fn delete_tag(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    if !state.db.tags.delete(id, auth.user_id).await? {
        return Err(ApiError::NotFound(format!("Tag {} not found", id)));
    }

    let cleared = state.db.notes.remove_tag_ref(id, auth.user_id).await?;
    debug!(
        subsystem = "api",
        op = "cascade",
        tag_id = %id,
        result_count = cleared,
        "pulled tag from notes"
    );

    Ok(StatusCode::NO_CONTENT)
}
