//! # grimoire-db
//!
//! Storage layer for grimoire.
//!
//! This crate provides:
//! - Connection pool management
//! - PostgreSQL store implementations for notes, folders, and tags
//!   (set-valued fields as uuid[] columns, mutated atomically)
//! - An in-memory backend satisfying the same contracts, used by tests and
//!   the `memory` store mode of the server
//!
//! ## Example
//!
//! ```rust,ignore
//! use grimoire_db::Database;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/grimoire").await?;
//!     let composer = db.composer();
//!     // ...
//!     Ok(())
//! }
//! ```

pub mod folders;
pub mod memory;
pub mod notes;
pub mod pool;
pub mod tags;

use std::sync::Arc;

use sqlx::PgPool;

// Re-export core types
pub use grimoire_core::*;

pub use folders::PgFolderStore;
pub use memory::{MemoryBackend, MemoryFolderStore, MemoryNoteStore, MemoryTagStore};
pub use notes::PgNoteStore;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};
pub use tags::PgTagStore;

/// Escape LIKE/ILIKE wildcard characters (`%`, `_`, `\`) in user input.
pub fn escape_like(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Translate a unique-constraint violation into `DuplicateName` at the store
/// boundary; anything else stays a database error.
pub(crate) fn translate_unique(err: sqlx::Error, kind: EntityKind, name: &str) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return Error::DuplicateName {
                kind,
                name: name.to_string(),
            };
        }
    }
    Error::Database(err)
}

/// Run pending schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Internal(format!("migration failed: {}", e)))
}

/// Combined store context handed to the application.
///
/// Holds one handle per store contract; the extra [`ReferenceStore`] views
/// are the strategy handles the reference reconciler runs against. Both the
/// PostgreSQL and the in-memory backend produce the same shape, so the core
/// components and the HTTP layer never know which one they are on — tests
/// run against `Database::in_memory()` without a port or a server.
#[derive(Clone)]
pub struct Database {
    pub notes: Arc<dyn NoteStore>,
    pub folders: Arc<dyn FolderStore>,
    pub tags: Arc<dyn TagStore>,
    folder_refs: Arc<dyn ReferenceStore>,
    tag_refs: Arc<dyn ReferenceStore>,
}

impl Database {
    /// Connect to PostgreSQL, run migrations, and build the store context.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = create_pool(database_url).await?;
        run_migrations(&pool).await?;
        Ok(Self::from_pool(pool))
    }

    /// Build the store context over an existing pool (no migration run).
    pub fn from_pool(pool: PgPool) -> Self {
        let notes = Arc::new(PgNoteStore::new(pool.clone()));
        let folders = Arc::new(PgFolderStore::new(pool.clone()));
        let tags = Arc::new(PgTagStore::new(pool));
        Self {
            notes,
            folder_refs: folders.clone(),
            tag_refs: tags.clone(),
            folders,
            tags,
        }
    }

    /// Build a fully in-memory store context.
    pub fn in_memory() -> Self {
        let backend = MemoryBackend::new();
        let folders = Arc::new(backend.folders());
        let tags = Arc::new(backend.tags());
        Self {
            notes: Arc::new(backend.notes()),
            folder_refs: folders.clone(),
            tag_refs: tags.clone(),
            folders,
            tags,
        }
    }

    /// Note composer wired to this store context.
    pub fn composer(&self) -> NoteComposer {
        NoteComposer::new(
            self.notes.clone(),
            self.folders.clone(),
            self.tags.clone(),
            self.tag_refs.clone(),
            self.folder_refs.clone(),
        )
    }
}
