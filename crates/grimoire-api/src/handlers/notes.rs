//! Note HTTP handlers.
//!
//! All the interesting work — reference reconciliation, ownership
//! validation, inverse-index maintenance — lives in the note composer;
//! handlers validate identifiers, translate misses into 404s, and shape
//! responses.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use grimoire_core::{parse_id, ComposeNoteRequest, NoteExpanded, NoteFilter};

use crate::auth::AuthUser;
use crate::{ApiError, AppState};

/// Query parameters for listing notes.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesQuery {
    /// Case-insensitive substring match over title and content.
    pub search_term: Option<String>,
    /// Only notes filed in this folder.
    pub folder_id: Option<String>,
    /// Only notes carrying this tag.
    pub tag_id: Option<String>,
}

/// List the caller's notes, expanded, most recently updated first.
pub async fn list_notes(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ListNotesQuery>,
) -> Result<Json<Vec<NoteExpanded>>, ApiError> {
    let filter = NoteFilter {
        owner_id: auth.user_id,
        search_term: query.search_term.filter(|s| !s.trim().is_empty()),
        folder_id: query.folder_id.as_deref().map(parse_id).transpose()?,
        tag_id: query.tag_id.as_deref().map(parse_id).transpose()?,
    };

    Ok(Json(state.composer.list(filter).await?))
}

/// Fetch one of the caller's notes. A well-formed id that matches nothing
/// the caller owns is a plain 404 — other owners' notes never leak.
pub async fn get_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<NoteExpanded>, ApiError> {
    let id = parse_id(&id)?;

    let note = state
        .composer
        .get(auth.user_id, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Note {} not found", id)))?;

    Ok(Json(note))
}

/// Create a note. Tag/folder entries may be `{id}` (existing) or `{name}`
/// (created on the fly, reusing an existing name under this owner).
pub async fn create_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(req): Json<ComposeNoteRequest>,
) -> Result<(StatusCode, Json<NoteExpanded>), ApiError> {
    let note = state.composer.create(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Update a note through the same composition path as create.
pub async fn update_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<ComposeNoteRequest>,
) -> Result<Json<NoteExpanded>, ApiError> {
    let id = parse_id(&id)?;

    let note = state
        .composer
        .update(auth.user_id, id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Note {} not found", id)))?;

    Ok(Json(note))
}

/// Delete a note. No cascade to tags or folders.
pub async fn delete_note(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;

    if state.composer.delete(auth.user_id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Note {} not found", id)))
    }
}
