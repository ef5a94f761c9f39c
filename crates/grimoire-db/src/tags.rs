//! Tag store implementation for PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use grimoire_core::{EntityKind, Error, ReferenceStore, Result, Tag, TagStore};

use crate::translate_unique;

const TAG_COLUMNS: &str = "id, name, owner_id, created_at, updated_at";

/// PostgreSQL implementation of [`TagStore`] and [`ReferenceStore`].
pub struct PgTagStore {
    pool: PgPool,
}

impl PgTagStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn tag_from_row(row: PgRow) -> Tag {
    Tag {
        id: row.get("id"),
        name: row.get("name"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl TagStore for PgTagStore {
    async fn find_by_id(&self, id: Uuid, owner_id: Uuid) -> Result<Option<Tag>> {
        let row = sqlx::query(&format!(
            "SELECT {TAG_COLUMNS} FROM tag WHERE id = $1 AND owner_id = $2"
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(tag_from_row))
    }

    async fn find_by_ids(&self, ids: &[Uuid], owner_id: Uuid) -> Result<Vec<Tag>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(&format!(
            "SELECT {TAG_COLUMNS} FROM tag WHERE owner_id = $1 AND id = ANY($2) ORDER BY name"
        ))
        .bind(owner_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(tag_from_row).collect())
    }

    async fn list(&self, owner_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(&format!(
            "SELECT {TAG_COLUMNS} FROM tag WHERE owner_id = $1 ORDER BY name"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(tag_from_row).collect())
    }

    async fn create(&self, owner_id: Uuid, name: &str) -> Result<Tag> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO tag (id, name, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $4)
            RETURNING {TAG_COLUMNS}
            "#
        ))
        .bind(Uuid::now_v7())
        .bind(name)
        .bind(owner_id)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| translate_unique(e, EntityKind::Tag, name))?;

        Ok(tag_from_row(row))
    }

    async fn create_many(&self, owner_id: Uuid, names: &[String]) -> Result<Vec<Tag>> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        let now = Utc::now();

        let mut tags = Vec::with_capacity(names.len());
        for name in names {
            let row = sqlx::query(&format!(
                r#"
                INSERT INTO tag (id, name, owner_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $4)
                RETURNING {TAG_COLUMNS}
                "#
            ))
            .bind(Uuid::now_v7())
            .bind(name)
            .bind(owner_id)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| translate_unique(e, EntityKind::Tag, name))?;
            tags.push(tag_from_row(row));
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(tags)
    }

    async fn rename(&self, id: Uuid, owner_id: Uuid, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE tag SET name = $3, updated_at = $4
            WHERE id = $1 AND owner_id = $2
            RETURNING {TAG_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| translate_unique(e, EntityKind::Tag, name))?;

        Ok(row.map(tag_from_row))
    }

    async fn delete(&self, id: Uuid, owner_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tag WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ReferenceStore for PgTagStore {
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
                INSERT INTO tag (id, name, owner_id, created_at, updated_at)
                VALUES ($1, $2, $3, $4, $4)
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
                sqlx::query_scalar("SELECT id FROM tag WHERE owner_id = $1 AND name = $2")
                    .bind(owner_id)
                    .bind(name)
                    .fetch_optional(&mut *tx)
                    .await
                    .map_err(Error::Database)?;

            match id {
                Some(id) => ids.push(id),
                None => {
                    return Err(Error::DuplicateName {
                        kind: EntityKind::Tag,
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
            sqlx::query_scalar("SELECT COUNT(*) FROM tag WHERE owner_id = $1 AND id = ANY($2)")
                .bind(owner_id)
                .bind(ids)
                .fetch_one(&self.pool)
                .await
                .map_err(Error::Database)?;

        Ok(count as usize)
    }
}
