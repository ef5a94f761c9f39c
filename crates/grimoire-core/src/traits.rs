//! Store and verifier contracts for grimoire.
//!
//! These traits define the interfaces concrete backends must satisfy,
//! enabling pluggable stores (PostgreSQL in production, in-memory in tests)
//! without the core logic knowing which one it runs against.
//!
//! Concurrency contract: implementations provide per-document atomicity for
//! the set-membership mutations (`append_note_id` / `remove_note_id` and the
//! `remove_*_ref` cascades) and enforce `(owner_id, name)` uniqueness for
//! tags and folders. Cross-document consistency is the composer's job.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Repository for note CRUD operations. All reads and writes are scoped to
/// an owner; an id that exists under another owner behaves like a miss.
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Fetch one owned note.
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>>;

    /// List owned notes matching `filter`, most recently updated first.
    async fn find_many(&self, filter: NoteFilter) -> Result<Vec<Note>>;

    /// Persist a new note.
    async fn create(&self, note: NewNote) -> Result<Note>;

    /// Replace an owned note's attributes. `None` when nothing matched.
    async fn update(&self, id: Uuid, owner_id: Uuid, patch: NotePatch) -> Result<Option<Note>>;

    /// Delete an owned note. `false` when nothing matched.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;

    /// Pull `folder_id` out of the `folders` set of every owned note that
    /// references it. Returns the number of notes touched.
    async fn remove_folder_ref(&self, folder_id: Uuid, owner_id: Uuid) -> Result<u64>;

    /// Pull `tag_id` out of the `tags` set of every owned note that
    /// references it. Returns the number of notes touched.
    async fn remove_tag_ref(&self, tag_id: Uuid, owner_id: Uuid) -> Result<u64>;
}

/// Repository for folder CRUD plus the `note_ids` inverse index.
#[async_trait]
pub trait FolderStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Folder>>;

    /// Fetch the owned subset of `ids`, name order.
    async fn find_by_ids(&self, ids: &[Uuid], owner_id: Uuid) -> Result<Vec<Folder>>;

    /// All folders of an owner, name order.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Folder>>;

    /// Create one folder; `(owner_id, name)` collisions fail with
    /// `DuplicateName`.
    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Folder>;

    /// Create a batch of folders; all-or-nothing on name collision.
    async fn create_many(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Folder>>;

    /// Rename an owned folder. `None` when nothing matched; name collisions
    /// fail with `DuplicateName`.
    async fn rename(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<Option<Folder>>;

    /// Delete an owned folder. `false` when nothing matched.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;

    /// Atomically add `note_id` to the folder's `note_ids` set. Idempotent:
    /// retries never produce duplicate entries.
    async fn append_note_id(&self, folder_id: Uuid, note_id: Uuid) -> Result<()>;

    /// Atomically remove `note_id` from the folder's `note_ids` set.
    async fn remove_note_id(&self, folder_id: Uuid, note_id: Uuid) -> Result<()>;
}

/// Repository for tag CRUD.
#[async_trait]
pub trait TagStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Tag>>;

    /// Fetch the owned subset of `ids`, name order.
    async fn find_by_ids(&self, ids: &[Uuid], owner_id: Uuid) -> Result<Vec<Tag>>;

    /// All tags of an owner, name order.
    async fn list(&self, owner_id: Uuid) -> Result<Vec<Tag>>;

    /// Create one tag; `(owner_id, name)` collisions fail with
    /// `DuplicateName`.
    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Tag>;

    /// Create a batch of tags; all-or-nothing on name collision.
    async fn create_many(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Tag>>;

    /// Rename an owned tag. `None` when nothing matched.
    async fn rename(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<Option<Tag>>;

    /// Delete an owned tag. `false` when nothing matched.
    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool>;
}

/// The reconciler's strategy seam, implemented by both the tag and the
/// folder store so one reconciler serves both entity kinds.
#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Resolve `names` to entity ids under `owner_id`, creating the missing
    /// ones. The result aligns with `names` by position. A uniqueness race
    /// lost against a concurrent writer surfaces as `DuplicateName`; the
    /// caller may retry and resolve to the now-existing id.
    async fn find_or_create(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Uuid>>;

    /// How many of `ids` exist under `owner_id`. Existence and ownership
    /// collapse into one predicate so other users' entities never leak.
    async fn count_owned(&self, ids: &[Uuid], owner_id: Uuid) -> Result<usize>;
}

/// Produces a verified user id from request credentials, or fails.
///
/// The HTTP layer consumes this as an injected collaborator; swapping the
/// authentication scheme never touches handlers.
#[async_trait]
pub trait AuthVerifier: Send + Sync {
    async fn verify(&self, credentials: &str) -> Result<Uuid>;
}
