//! Note store implementation for PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use grimoire_core::{Error, NewNote, Note, NoteFilter, NotePatch, NoteStore, Result};

use crate::escape_like;

const NOTE_COLUMNS: &str = "id, title, content, owner_id, folder_ids, tag_ids, created_at, updated_at";

/// PostgreSQL implementation of [`NoteStore`].
///
/// The `folder_ids`/`tag_ids` sets live in uuid[] columns; the cascade
/// helpers mutate them with single atomic UPDATEs.
pub struct PgNoteStore {
    pool: PgPool,
}

impl PgNoteStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn note_from_row(row: PgRow) -> Note {
    Note {
        id: row.get("id"),
        title: row.get("title"),
        content: row.get("content"),
        owner_id: row.get("owner_id"),
        folders: row.get("folder_ids"),
        tags: row.get("tag_ids"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Note>> {
        let row = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM note WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(note_from_row))
    }

    async fn find_many(&self, filter: NoteFilter) -> Result<Vec<Note>> {
        let pattern = filter
            .search_term
            .as_deref()
            .map(|term| format!("%{}%", escape_like(term)));

        let rows = sqlx::query(&format!(
            r#"
            SELECT {NOTE_COLUMNS}
            FROM note
            WHERE owner_id = $1
              AND ($2::text IS NULL OR title ILIKE $2 OR content ILIKE $2)
              AND ($3::uuid IS NULL OR folder_ids @> ARRAY[$3]::uuid[])
              AND ($4::uuid IS NULL OR tag_ids @> ARRAY[$4]::uuid[])
            ORDER BY updated_at DESC
            "#
        ))
        .bind(filter.owner_id)
        .bind(pattern)
        .bind(filter.folder_id)
        .bind(filter.tag_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(note_from_row).collect())
    }

    async fn create(&self, note: NewNote) -> Result<Note> {
        let id = Uuid::now_v7();
        let now = Utc::now();

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO note (id, title, content, owner_id, folder_ids, tag_ids, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&note.title)
        .bind(&note.content)
        .bind(note.owner_id)
        .bind(&note.folders)
        .bind(&note.tags)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(note_from_row(row))
    }

    async fn update(&self, id: Uuid, owner_id: Uuid, patch: NotePatch) -> Result<Option<Note>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE note
            SET title = $3, content = $4, folder_ids = $5, tag_ids = $6, updated_at = $7
            WHERE id = $1 AND owner_id = $2
            RETURNING {NOTE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(&patch.title)
        .bind(&patch.content)
        .bind(&patch.folders)
        .bind(&patch.tags)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(note_from_row))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_folder_ref(&self, folder_id: Uuid, owner_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE note
            SET folder_ids = array_remove(folder_ids, $1), updated_at = $3
            WHERE owner_id = $2 AND folder_ids @> ARRAY[$1]::uuid[]
            "#,
        )
        .bind(folder_id)
        .bind(owner_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }

    async fn remove_tag_ref(&self, tag_id: Uuid, owner_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE note
            SET tag_ids = array_remove(tag_ids, $1), updated_at = $3
            WHERE owner_id = $2 AND tag_ids @> ARRAY[$1]::uuid[]
            "#,
        )
        .bind(tag_id)
        .bind(owner_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(result.rows_affected())
    }
}
