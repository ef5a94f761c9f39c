//! In-memory store implementations.
//!
//! A single shared backend serves all three stores so tests (and the
//! `memory` store backend of the server binary) get a coherent dataset
//! without an external database or a bound port. Every operation takes the
//! backend lock once, which gives the same per-document atomicity the
//! PostgreSQL stores get from single-statement UPDATEs.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use grimoire_core::{
    EntityKind, Error, Folder, FolderStore, NewNote, Note, NoteFilter, NotePatch, NoteStore,
    ReferenceStore, Result, Tag, TagStore,
};

#[derive(Default)]
struct MemoryInner {
    notes: HashMap<Uuid, Note>,
    folders: HashMap<Uuid, Folder>,
    tags: HashMap<Uuid, Tag>,
}

/// Shared state behind the in-memory stores.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Note store view of this backend.
    pub fn notes(&self) -> MemoryNoteStore {
        MemoryNoteStore {
            backend: self.clone(),
        }
    }

    /// Folder store view of this backend.
    pub fn folders(&self) -> MemoryFolderStore {
        MemoryFolderStore {
            backend: self.clone(),
        }
    }

    /// Tag store view of this backend.
    pub fn tags(&self) -> MemoryTagStore {
        MemoryTagStore {
            backend: self.clone(),
        }
    }
}

/// In-memory implementation of [`NoteStore`].
#[derive(Clone)]
pub struct MemoryNoteStore {
    backend: MemoryBackend,
}

/// In-memory implementation of [`FolderStore`] and [`ReferenceStore`].
#[derive(Clone)]
pub struct MemoryFolderStore {
    backend: MemoryBackend,
}

/// In-memory implementation of [`TagStore`] and [`ReferenceStore`].
#[derive(Clone)]
pub struct MemoryTagStore {
    backend: MemoryBackend,
}

fn matches_filter(note: &Note, filter: &NoteFilter) -> bool {
    if note.owner_id != filter.owner_id {
        return false;
    }
    if let Some(term) = &filter.search_term {
        let term = term.to_lowercase();
        let in_title = note.title.to_lowercase().contains(&term);
        let in_content = note
            .content
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains(&term));
        if !in_title && !in_content {
            return false;
        }
    }
    if let Some(folder_id) = filter.folder_id {
        if !note.folders.contains(&folder_id) {
            return false;
        }
    }
    if let Some(tag_id) = filter.tag_id {
        if !note.tags.contains(&tag_id) {
            return false;
        }
    }
    true
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>> {
        let inner = self.backend.inner.read().await;
        Ok(inner
            .notes
            .get(&id)
            .filter(|n| n.owner_id == owner_id)
            .cloned())
    }

    async fn find_many(&self, filter: NoteFilter) -> Result<Vec<Note>> {
        let inner = self.backend.inner.read().await;
        let mut notes: Vec<Note> = inner
            .notes
            .values()
            .filter(|n| matches_filter(n, &filter))
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(notes)
    }

    async fn create(&self, note: NewNote) -> Result<Note> {
        let now = Utc::now();
        let note = Note {
            id: Uuid::now_v7(),
            title: note.title,
            content: note.content,
            owner_id: note.owner_id,
            folders: note.folders,
            tags: note.tags,
            created_at: now,
            updated_at: now,
        };

        let mut inner = self.backend.inner.write().await;
        inner.notes.insert(note.id, note.clone());
        Ok(note)
    }

    async fn update(&self, id: Uuid, owner_id: Uuid, patch: NotePatch) -> Result<Option<Note>> {
        let mut inner = self.backend.inner.write().await;
        let Some(note) = inner.notes.get_mut(&id).filter(|n| n.owner_id == owner_id) else {
            return Ok(None);
        };

        note.title = patch.title;
        note.content = patch.content;
        note.folders = patch.folders;
        note.tags = patch.tags;
        note.updated_at = Utc::now();
        Ok(Some(note.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut inner = self.backend.inner.write().await;
        let owned = inner.notes.get(&id).is_some_and(|n| n.owner_id == owner_id);
        if owned {
            inner.notes.remove(&id);
        }
        Ok(owned)
    }

    async fn remove_folder_ref(&self, folder_id: Uuid, owner_id: Uuid) -> Result<u64> {
        let mut inner = self.backend.inner.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for note in inner.notes.values_mut() {
            if note.owner_id == owner_id && note.folders.contains(&folder_id) {
                note.folders.retain(|f| *f != folder_id);
                note.updated_at = now;
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn remove_tag_ref(&self, tag_id: Uuid, owner_id: Uuid) -> Result<u64> {
        let mut inner = self.backend.inner.write().await;
        let now = Utc::now();
        let mut touched = 0;
        for note in inner.notes.values_mut() {
            if note.owner_id == owner_id && note.tags.contains(&tag_id) {
                note.tags.retain(|t| *t != tag_id);
                note.updated_at = now;
                touched += 1;
            }
        }
        Ok(touched)
    }
}

#[async_trait]
impl FolderStore for MemoryFolderStore {
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Folder>> {
        let inner = self.backend.inner.read().await;
        Ok(inner
            .folders
            .get(&id)
            .filter(|f| f.owner_id == owner_id)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid], owner_id: Uuid) -> Result<Vec<Folder>> {
        let inner = self.backend.inner.read().await;
        let mut folders: Vec<Folder> = ids
            .iter()
            .filter_map(|id| inner.folders.get(id))
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Folder>> {
        let inner = self.backend.inner.read().await;
        let mut folders: Vec<Folder> = inner
            .folders
            .values()
            .filter(|f| f.owner_id == owner_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Folder> {
        let mut inner = self.backend.inner.write().await;
        insert_folder(&mut inner, owner_id, name)
    }

    async fn create_many(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Folder>> {
        // Single lock hold: a duplicate anywhere in the batch fails the
        // whole call before any entry becomes visible.
        let mut inner = self.backend.inner.write().await;
        for name in names {
            if folder_name_taken(&inner, owner_id, name) {
                return Err(Error::DuplicateName {
                    kind: EntityKind::Folder,
                    name: name.clone(),
                });
            }
        }
        names
            .iter()
            .map(|name| insert_folder(&mut inner, owner_id, name))
            .collect()
    }

    async fn rename(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<Option<Folder>> {
        let mut inner = self.backend.inner.write().await;
        let Some(current_name) = inner
            .folders
            .get(&id)
            .filter(|f| f.owner_id == owner_id)
            .map(|f| f.name.clone())
        else {
            return Ok(None);
        };

        if current_name != name && folder_name_taken(&inner, owner_id, name) {
            return Err(Error::DuplicateName {
                kind: EntityKind::Folder,
                name: name.to_string(),
            });
        }

        let Some(folder) = inner.folders.get_mut(&id) else {
            return Ok(None);
        };
        folder.name = name.to_string();
        folder.updated_at = Utc::now();
        Ok(Some(folder.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut inner = self.backend.inner.write().await;
        let owned = inner
            .folders
            .get(&id)
            .is_some_and(|f| f.owner_id == owner_id);
        if owned {
            inner.folders.remove(&id);
        }
        Ok(owned)
    }

    async fn append_note_id(&self, folder_id: Uuid, note_id: Uuid) -> Result<()> {
        let mut inner = self.backend.inner.write().await;
        if let Some(folder) = inner.folders.get_mut(&folder_id) {
            if !folder.note_ids.contains(&note_id) {
                folder.note_ids.push(note_id);
                folder.updated_at = Utc::now();
            }
        }
        Ok(())
    }

    async fn remove_note_id(&self, folder_id: Uuid, note_id: Uuid) -> Result<()> {
        let mut inner = self.backend.inner.write().await;
        if let Some(folder) = inner.folders.get_mut(&folder_id) {
            if folder.note_ids.contains(&note_id) {
                folder.note_ids.retain(|n| *n != note_id);
                folder.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ReferenceStore for MemoryFolderStore {
    async fn find_or_create(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Uuid>> {
        let mut inner = self.backend.inner.write().await;
        names
            .iter()
            .map(|name| {
                if let Some(existing) = inner
                    .folders
                    .values()
                    .find(|f| f.owner_id == owner_id && f.name == *name)
                {
                    return Ok(existing.id);
                }
                insert_folder(&mut inner, owner_id, name).map(|f| f.id)
            })
            .collect()
    }

    async fn count_owned(&self, ids: &[Uuid], owner_id: Uuid) -> Result<usize> {
        let inner = self.backend.inner.read().await;
        Ok(ids
            .iter()
            .filter(|id| {
                inner
                    .folders
                    .get(*id)
                    .is_some_and(|f| f.owner_id == owner_id)
            })
            .count())
    }
}

fn folder_name_taken(inner: &MemoryInner, owner_id: Uuid, name: &str) -> bool {
    inner
        .folders
        .values()
        .any(|f| f.owner_id == owner_id && f.name == name)
}

fn insert_folder(inner: &mut MemoryInner, owner_id: Uuid, name: &str) -> Result<Folder> {
    if folder_name_taken(inner, owner_id, name) {
        return Err(Error::DuplicateName {
            kind: EntityKind::Folder,
            name: name.to_string(),
        });
    }
    let now = Utc::now();
    let folder = Folder {
        id: Uuid::now_v7(),
        name: name.to_string(),
        owner_id,
        note_ids: Vec::new(),
        created_at: now,
        updated_at: now,
    };
    inner.folders.insert(folder.id, folder.clone());
    Ok(folder)
}

#[async_trait]
impl TagStore for MemoryTagStore {
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Tag>> {
        let inner = self.backend.inner.read().await;
        Ok(inner
            .tags
            .get(&id)
            .filter(|t| t.owner_id == owner_id)
            .cloned())
    }

    async fn find_by_ids(&self, ids: &[Uuid], owner_id: Uuid) -> Result<Vec<Tag>> {
        let inner = self.backend.inner.read().await;
        let mut tags: Vec<Tag> = ids
            .iter()
            .filter_map(|id| inner.tags.get(id))
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Tag>> {
        let inner = self.backend.inner.read().await;
        let mut tags: Vec<Tag> = inner
            .tags
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Tag> {
        let mut inner = self.backend.inner.write().await;
        insert_tag(&mut inner, owner_id, name)
    }

    async fn create_many(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Tag>> {
        let mut inner = self.backend.inner.write().await;
        for name in names {
            if tag_name_taken(&inner, owner_id, name) {
                return Err(Error::DuplicateName {
                    kind: EntityKind::Tag,
                    name: name.clone(),
                });
            }
        }
        names
            .iter()
            .map(|name| insert_tag(&mut inner, owner_id, name))
            .collect()
    }

    async fn rename(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<Option<Tag>> {
        let mut inner = self.backend.inner.write().await;
        let Some(current_name) = inner
            .tags
            .get(&id)
            .filter(|t| t.owner_id == owner_id)
            .map(|t| t.name.clone())
        else {
            return Ok(None);
        };

        if current_name != name && tag_name_taken(&inner, owner_id, name) {
            return Err(Error::DuplicateName {
                kind: EntityKind::Tag,
                name: name.to_string(),
            });
        }

        let Some(tag) = inner.tags.get_mut(&id) else {
            return Ok(None);
        };
        tag.name = name.to_string();
        tag.updated_at = Utc::now();
        Ok(Some(tag.clone()))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let mut inner = self.backend.inner.write().await;
        let owned = inner.tags.get(&id).is_some_and(|t| t.owner_id == owner_id);
        if owned {
            inner.tags.remove(&id);
        }
        Ok(owned)
    }
}

#[async_trait]
impl ReferenceStore for MemoryTagStore {
    async fn find_or_create(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Uuid>> {
        let mut inner = self.backend.inner.write().await;
        names
            .iter()
            .map(|name| {
                if let Some(existing) = inner
                    .tags
                    .values()
                    .find(|t| t.owner_id == owner_id && t.name == *name)
                {
                    return Ok(existing.id);
                }
                insert_tag(&mut inner, owner_id, name).map(|t| t.id)
            })
            .collect()
    }

    async fn count_owned(&self, ids: &[Uuid], owner_id: Uuid) -> Result<usize> {
        let inner = self.backend.inner.read().await;
        Ok(ids
            .iter()
            .filter(|id| inner.tags.get(*id).is_some_and(|t| t.owner_id == owner_id))
            .count())
    }
}

fn tag_name_taken(inner: &MemoryInner, owner_id: Uuid, name: &str) -> bool {
    inner
        .tags
        .values()
        .any(|t| t.owner_id == owner_id && t.name == name)
}

fn insert_tag(inner: &mut MemoryInner, owner_id: Uuid, name: &str) -> Result<Tag> {
    if tag_name_taken(inner, owner_id, name) {
        return Err(Error::DuplicateName {
            kind: EntityKind::Tag,
            name: name.to_string(),
        });
    }
    let now = Utc::now();
    let tag = Tag {
        id: Uuid::now_v7(),
        name: name.to_string(),
        owner_id,
        created_at: now,
        updated_at: now,
    };
    inner.tags.insert(tag.id, tag.clone());
    Ok(tag)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_note_id_is_idempotent() {
        let backend = MemoryBackend::new();
        let owner = Uuid::new_v4();
        let folders = backend.folders();
        let folder = folders.create(owner, "inbox").await.unwrap();
        let note_id = Uuid::new_v4();

        folders.append_note_id(folder.id, note_id).await.unwrap();
        folders.append_note_id(folder.id, note_id).await.unwrap();

        let folder = folders.find_by_id(folder.id, owner).await.unwrap().unwrap();
        assert_eq!(folder.note_ids, vec![note_id]);
    }

    #[tokio::test]
    async fn test_duplicate_folder_name_rejected_per_owner() {
        let backend = MemoryBackend::new();
        let folders = backend.folders();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        folders.create(alice, "inbox").await.unwrap();
        let err = folders.create(alice, "inbox").await.unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));

        // Same name under a different owner is fine.
        folders.create(bob, "inbox").await.unwrap();
    }

    #[tokio::test]
    async fn test_find_or_create_reuses_existing_name() {
        let backend = MemoryBackend::new();
        let tags = backend.tags();
        let owner = Uuid::new_v4();

        let existing = tags.create(owner, "urgent").await.unwrap();
        let ids = tags
            .find_or_create(owner, &["urgent".to_string(), "later".to_string()])
            .await
            .unwrap();

        assert_eq!(ids.len(), 2);
        assert_eq!(ids[0], existing.id);
        assert_eq!(tags.list(owner).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_create_many_is_all_or_nothing() {
        let backend = MemoryBackend::new();
        let tags = backend.tags();
        let owner = Uuid::new_v4();
        tags.create(owner, "b").await.unwrap();

        let err = tags
            .create_many(owner, &["a".to_string(), "b".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { .. }));

        // "a" must not have been created on the failing path.
        assert_eq!(tags.list(owner).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_remove_tag_ref_touches_only_referencing_notes() {
        let backend = MemoryBackend::new();
        let owner = Uuid::new_v4();
        let notes = backend.notes();
        let tag_id = Uuid::new_v4();

        notes
            .create(NewNote {
                owner_id: owner,
                title: "tagged".into(),
                content: None,
                folders: vec![],
                tags: vec![tag_id],
            })
            .await
            .unwrap();
        notes
            .create(NewNote {
                owner_id: owner,
                title: "untagged".into(),
                content: None,
                folders: vec![],
                tags: vec![],
            })
            .await
            .unwrap();

        let touched = notes.remove_tag_ref(tag_id, owner).await.unwrap();
        assert_eq!(touched, 1);

        let all = notes.find_many(NoteFilter::for_owner(owner)).await.unwrap();
        assert!(all.iter().all(|n| n.tags.is_empty()));
    }

    #[tokio::test]
    async fn test_find_many_search_is_case_insensitive() {
        let backend = MemoryBackend::new();
        let owner = Uuid::new_v4();
        let notes = backend.notes();

        notes
            .create(NewNote {
                owner_id: owner,
                title: "Groceries".into(),
                content: Some("buy CHEESE".into()),
                folders: vec![],
                tags: vec![],
            })
            .await
            .unwrap();

        let mut filter = NoteFilter::for_owner(owner);
        filter.search_term = Some("cheese".into());
        assert_eq!(notes.find_many(filter).await.unwrap().len(), 1);

        let mut filter = NoteFilter::for_owner(owner);
        filter.search_term = Some("grocer".into());
        assert_eq!(notes.find_many(filter).await.unwrap().len(), 1);

        let mut filter = NoteFilter::for_owner(owner);
        filter.search_term = Some("absent".into());
        assert!(notes.find_many(filter).await.unwrap().is_empty());
    }
}
