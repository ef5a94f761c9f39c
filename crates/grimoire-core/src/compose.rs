//! Note composition: the orchestration layer behind every note write.
//!
//! The composer reconciles tag and folder references (concurrently — the
//! two have no data dependency), persists the note, and only then maintains
//! the folder-side `note_ids` inverse index, so a folder never references a
//! note that does not exist yet.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::*;
use crate::reconcile::ReferenceReconciler;
use crate::traits::{FolderStore, NoteStore, ReferenceStore, TagStore};

/// Orchestrates note create/update/delete against the entity stores.
#[derive(Clone)]
pub struct NoteComposer {
    notes: Arc<dyn NoteStore>,
    folders: Arc<dyn FolderStore>,
    tags: Arc<dyn TagStore>,
    tag_refs: ReferenceReconciler,
    folder_refs: ReferenceReconciler,
}

impl NoteComposer {
    pub fn new(
        notes: Arc<dyn NoteStore>,
        folders: Arc<dyn FolderStore>,
        tags: Arc<dyn TagStore>,
        tag_refs: Arc<dyn ReferenceStore>,
        folder_refs: Arc<dyn ReferenceStore>,
    ) -> Self {
        Self {
            notes,
            folders,
            tags,
            tag_refs: ReferenceReconciler::new(EntityKind::Tag, tag_refs),
            folder_refs: ReferenceReconciler::new(EntityKind::Folder, folder_refs),
        }
    }

    /// Create a note from a composition request.
    pub async fn create(&self, owner_id: Uuid, req: ComposeNoteRequest) -> Result<NoteExpanded> {
        let title = require_title(&req)?;

        let (tags, folders) = tokio::try_join!(
            self.tag_refs.reconcile(req.tags, owner_id),
            self.folder_refs.reconcile(req.folders, owner_id),
        )?;

        let note = self
            .notes
            .create(NewNote {
                owner_id,
                title,
                content: req.content,
                tags: tags.unwrap_or_default(),
                folders: folders.unwrap_or_default(),
            })
            .await?;

        // The note row is durable; wire up the inverse index.
        for folder_id in &note.folders {
            self.folders.append_note_id(*folder_id, note.id).await?;
        }

        debug!(
            component = "compose",
            op = "create",
            note_id = %note.id,
            folder_count = note.folders.len(),
            tag_count = note.tags.len(),
            "note created"
        );
        self.expand(note).await
    }

    /// Update a note through the same reconciliation path as create.
    ///
    /// `None` tag/folder input preserves the previous set; `Some(vec![])`
    /// clears it. Folders dropped from the note lose its id in `note_ids`,
    /// folders gained acquire it. Returns `Ok(None)` when no owned note
    /// matched.
    pub async fn update(
        &self,
        owner_id: Uuid,
        id: Uuid,
        req: ComposeNoteRequest,
    ) -> Result<Option<NoteExpanded>> {
        let title = require_title(&req)?;

        let Some(prev) = self.notes.find_by_id(id, owner_id).await? else {
            return Ok(None);
        };

        let (tags, folders) = tokio::try_join!(
            self.tag_refs.reconcile(req.tags, owner_id),
            self.folder_refs.reconcile(req.folders, owner_id),
        )?;

        let patch = NotePatch {
            title,
            content: req.content,
            tags: tags.unwrap_or_else(|| prev.tags.clone()),
            folders: folders.unwrap_or_else(|| prev.folders.clone()),
        };

        let Some(note) = self.notes.update(id, owner_id, patch).await? else {
            return Ok(None);
        };

        // Diff the folder sets so note_ids never drifts after reassignment.
        let prev_set: HashSet<Uuid> = prev.folders.iter().copied().collect();
        let next_set: HashSet<Uuid> = note.folders.iter().copied().collect();
        for removed in prev.folders.iter().filter(|f| !next_set.contains(*f)) {
            self.folders.remove_note_id(*removed, note.id).await?;
        }
        for added in note.folders.iter().filter(|f| !prev_set.contains(*f)) {
            self.folders.append_note_id(*added, note.id).await?;
        }

        debug!(
            component = "compose",
            op = "update",
            note_id = %note.id,
            folders_removed = prev_set.difference(&next_set).count(),
            folders_added = next_set.difference(&prev_set).count(),
            "note updated"
        );
        Ok(Some(self.expand(note).await?))
    }

    /// Delete a note. No cascade: tag/folder cleanup on *their* deletion is
    /// owned by the tag/folder handlers, and a disappearing note does not
    /// orphan either. Returns `false` when no owned note matched.
    pub async fn delete(&self, owner_id: Uuid, id: Uuid) -> Result<bool> {
        self.notes.delete(id, owner_id).await
    }

    /// Fetch one owned note, expanded.
    pub async fn get(&self, owner_id: Uuid, id: Uuid) -> Result<Option<NoteExpanded>> {
        match self.notes.find_by_id(id, owner_id).await? {
            Some(note) => Ok(Some(self.expand(note).await?)),
            None => Ok(None),
        }
    }

    /// List owned notes matching `filter`, expanded, most recently updated
    /// first.
    pub async fn list(&self, filter: NoteFilter) -> Result<Vec<NoteExpanded>> {
        let owner_id = filter.owner_id;
        let notes = self.notes.find_many(filter).await?;
        self.expand_many(owner_id, notes).await
    }

    async fn expand(&self, note: Note) -> Result<NoteExpanded> {
        let owner_id = note.owner_id;
        self.expand_many(owner_id, vec![note])
            .await?
            .pop()
            .ok_or_else(|| Error::Internal("note expansion dropped a note".to_string()))
    }

    /// Batch "populate by id": one tag fetch and one folder fetch for the
    /// whole page, then a projection preserving each note's stored order.
    async fn expand_many(&self, owner_id: Uuid, notes: Vec<Note>) -> Result<Vec<NoteExpanded>> {
        let mut tag_ids: Vec<Uuid> = Vec::new();
        let mut folder_ids: Vec<Uuid> = Vec::new();
        let mut seen_tags = HashSet::new();
        let mut seen_folders = HashSet::new();
        for note in &notes {
            for t in &note.tags {
                if seen_tags.insert(*t) {
                    tag_ids.push(*t);
                }
            }
            for f in &note.folders {
                if seen_folders.insert(*f) {
                    folder_ids.push(*f);
                }
            }
        }

        let (tags, folders) = tokio::try_join!(
            self.tags.find_by_ids(&tag_ids, owner_id),
            self.folders.find_by_ids(&folder_ids, owner_id),
        )?;
        let tag_map: HashMap<Uuid, Tag> = tags.into_iter().map(|t| (t.id, t)).collect();
        let folder_map: HashMap<Uuid, Folder> = folders.into_iter().map(|f| (f.id, f)).collect();

        Ok(notes
            .into_iter()
            .map(|note| NoteExpanded {
                tags: note
                    .tags
                    .iter()
                    .filter_map(|id| tag_map.get(id).cloned())
                    .collect(),
                folders: note
                    .folders
                    .iter()
                    .filter_map(|id| folder_map.get(id).cloned())
                    .collect(),
                id: note.id,
                title: note.title,
                content: note.content,
                owner_id: note.owner_id,
                created_at: note.created_at,
                updated_at: note.updated_at,
            })
            .collect())
    }
}

/// Extract a usable title or fail with `MissingTitle`.
fn require_title(req: &ComposeNoteRequest) -> Result<String> {
    match req.title.as_deref().map(str::trim) {
        Some(t) if !t.is_empty() => Ok(t.to_string()),
        _ => Err(Error::MissingTitle),
    }
}
