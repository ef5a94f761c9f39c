//! Folder store implementation for PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use grimoire_core::{EntityKind, Error, Folder, FolderStore, ReferenceStore, Result};

use crate::translate_unique;

const FOLDER_COLUMNS: &str = "id, name, owner_id, note_ids, created_at, updated_at";

/// PostgreSQL implementation of [`FolderStore`] and [`ReferenceStore`].
pub struct PgFolderStore {
    pool: PgPool,
}

impl PgFolderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn folder_from_row(row: PgRow) -> Folder {
    Folder {
        id: row.get("id"),
        name: row.get("name"),
        owner_id: row.get("owner_id"),
        note_ids: row.get("note_ids"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl FolderStore for PgFolderStore {
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Folder>> {
        let row = sqlx::query(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folder WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(folder_from_row))
    }

    async fn find_by_ids(&self, ids: &[Uuid], owner_id: Uuid) -> Result<Vec<Folder>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folder
             WHERE owner_id = $1 AND id = ANY($2) ORDER BY name"
        ))
        .bind(owner_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(folder_from_row).collect())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Folder>> {
        let rows = sqlx::query(&format!(
            "SELECT {FOLDER_COLUMNS} FROM folder WHERE owner_id = $1 ORDER BY name"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(folder_from_row).collect())
    }

    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Folder> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO folder (id, name, owner_id, note_ids, created_at, updated_at)
            VALUES ($1, $2, $3, '{{}}', $4, $4)
            RETURNING {FOLDER_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| translate_unique(e, EntityKind::Folder, name))?;

        Ok(folder_from_row(row))
    }

    async fn create_many(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Folder>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let now = Utc::now();

        let mut folders = Vec::with_capacity(names.len());
        for name in names {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO folder (id, name, owner_id, note_ids, created_at, updated_at)
                VALUES ($1, $2, $3, '{{}}', $4, $4)
                RETURNING {FOLDER_COLUMNS}
                "#
            ))
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(owner_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| translate_unique(e, EntityKind::Folder, name))?;
            folders.push(folder_from_row(row));
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(folders)
    }

    async fn rename(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<Option<Folder>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE folder SET name = $3, updated_at = $4
            WHERE id = $1 AND owner_id = $2
            RETURNING {FOLDER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| translate_unique(e, EntityKind::Folder, name))?;

        Ok(row.map(folder_from_row))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM folder WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_note_id(&self, folder_id: Uuid, note_id: Uuid) -> Result<()> {
        // Containment guard keeps the append idempotent under retries.
        sqlx::query(
            r#"
            UPDATE folder
            SET note_ids = array_append(note_ids, $2), updated_at = $3
            WHERE id = $1 AND NOT (note_ids @> ARRAY[$2]::uuid[])
            "#,
        )
        .bind(folder_id)
        .bind(note_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn remove_note_id(&self, folder_id: Uuid, note_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE folder
            SET note_ids = array_remove(note_ids, $2), updated_at = $3
            WHERE id = $1 AND note_ids @> ARRAY[$2]::uuid[]
            "#,
        )
        .bind(folder_id)
        .bind(note_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }
}

#[async_trait]
impl ReferenceStore for PgFolderStore {
    async fn find_or_create(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Uuid>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let now = Utc::now();

        let mut ids = Vec::with_capacity(names.len());
        for name in names {
            sqlx::query(
                r#"
                INSERT INTO folder (id, name, owner_id, note_ids, created_at, updated_at)
                VALUES ($1, $2, $3, '{}', $4, $4)
                ON CONFLICT (owner_id, name) DO NOTHING
                "#,
            )
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(owner_id)
            .bind(now)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

            let id: Option<Uuid> =
                sqlx::query_scalar("SELECT id FROM folder WHERE owner_id = $1 AND name = $2")
                    .bind(owner_id)
                    .bind(name)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(Error::Database)?;

            match id {
                Some(id) => ids.push(id),
                // Insert conflicted against a row we cannot see yet: a
                // concurrent writer holds the name. Lose the race loudly.
                None => {
                    return Err(Error::DuplicateName {
                        kind: EntityKind::Folder,
                        name: name.clone(),
                    })
                }
            }
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(ids)
    }

    async fn count_owned(&self, ids: &[Uuid], owner_id: Uuid) -> Result<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM folder WHERE owner_id = $1 AND id = ANY($2)")
                .bind(owner_id)
                .bind(ids)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(count as usize)
    }
}
