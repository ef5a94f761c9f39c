//! Core data models for grimoire.
//!
//! Entity ids are UUIDs (v7 at creation time, so ids sort chronologically).
//! JSON field names follow the wire shapes the clients already speak
//! (camelCase), hence the `rename_all` attributes on API-facing types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The two entity kinds a note can reference.
///
/// Used as the strategy parameter of the reference reconciler and in the
/// error taxonomy, so "tag" vs "folder" never turns into copy-pasted code
/// paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tag,
    Folder,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Tag => "tag",
            EntityKind::Folder => "folder",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted note.
///
/// `folders` and `tags` hold ids of entities owned by the same `owner_id`;
/// the reconciliation path guarantees the invariant before every write.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub owner_id: Uuid,
    pub folders: Vec<Uuid>,
    pub tags: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted folder.
///
/// `note_ids` is a redundant inverse index over `Note::folders`, maintained
/// by the note composer. A note id may linger here after its note is deleted
/// (note deletion does not cascade); readers tolerate that.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub note_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A persisted tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub name: String,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tag/folder descriptor as it arrives in a note body: either an existing
/// entity by id, or a new entity by name.
///
/// `_id` is accepted as an alias for `id` for older clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefInput {
    #[serde(default, alias = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl RefInput {
    /// Descriptor referencing an existing entity by id.
    pub fn by_id(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
        }
    }

    /// Descriptor requesting creation of a new entity by name.
    pub fn by_name(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
        }
    }
}

/// Note create/update body consumed by the note composer.
///
/// `tags`/`folders` are `None` when the request leaves the reference set
/// unchanged, and `Some(vec![])` when it clears it. `title` stays optional
/// at the serde layer so a missing title surfaces as `MissingTitle`, not as
/// a deserialization failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComposeNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<RefInput>>,
    #[serde(default)]
    pub folders: Option<Vec<RefInput>>,
}

/// Attributes for persisting a new note. Built by the composer after
/// reconciliation; the id sets are already validated.
#[derive(Debug, Clone)]
pub struct NewNote {
    pub owner_id: Uuid,
    pub title: String,
    pub content: Option<String>,
    pub folders: Vec<Uuid>,
    pub tags: Vec<Uuid>,
}

/// Full-replacement patch for an existing note.
#[derive(Debug, Clone)]
pub struct NotePatch {
    pub title: String,
    pub content: Option<String>,
    pub folders: Vec<Uuid>,
    pub tags: Vec<Uuid>,
}

/// Owner-scoped note listing filter.
#[derive(Debug, Clone)]
pub struct NoteFilter {
    pub owner_id: Uuid,
    /// Case-insensitive substring match over title and content.
    pub search_term: Option<String>,
    /// Only notes filed in this folder.
    pub folder_id: Option<Uuid>,
    /// Only notes carrying this tag.
    pub tag_id: Option<Uuid>,
}

impl NoteFilter {
    /// Filter matching every note of `owner_id`.
    pub fn for_owner(owner_id: Uuid) -> Self {
        Self {
            owner_id,
            search_term: None,
            folder_id: None,
            tag_id: None,
        }
    }
}

/// A note with its tag/folder references expanded to full entities, the
/// shape every note endpoint responds with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteExpanded {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub owner_id: Uuid,
    pub folders: Vec<Folder>,
    pub tags: Vec<Tag>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
