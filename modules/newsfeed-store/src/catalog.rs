use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;

use newsfeed_common::{Author, Media, Publication};

use crate::error::{Result, StoreError};

/// Canonical store of publications. The only component that holds content;
/// everything else points at it by id.
#[derive(Clone)]
pub struct PublicationCatalog {
    pool: PgPool,
}

/// A row from the publications table.
#[derive(Debug, Clone, sqlx::FromRow)]
struct PublicationRow {
    id: String,
    content: String,
    author_id: String,
    author_name: String,
    author_avatar: String,
    created_on: DateTime<Utc>,
    updated_on: DateTime<Utc>,
    media: serde_json::Value,
}

impl PublicationRow {
    fn into_publication(self) -> Result<Publication> {
        let media: Vec<Media> = serde_json::from_value(self.media)
            .map_err(|e| StoreError::CorruptRow(format!("media on {}: {e}", self.id)))?;

        Ok(Publication {
            id: self.id,
            content: self.content,
            author: Author {
                id: self.author_id,
                full_name: self.author_name,
                avatar_url: self.author_avatar,
            },
            created_on: self.created_on,
            updated_on: self.updated_on,
            media,
        })
    }
}

impl PublicationCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Idempotent upsert keyed by id. Delivery is at-least-once, so a
    /// duplicate "created" event must neither error nor create a second row.
    pub async fn put(&self, p: &Publication) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO publications
                (id, content, author_id, author_name, author_avatar, created_on, updated_on, media)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                content       = EXCLUDED.content,
                author_name   = EXCLUDED.author_name,
                author_avatar = EXCLUDED.author_avatar,
                updated_on    = EXCLUDED.updated_on,
                media         = EXCLUDED.media
            "#,
        )
        .bind(&p.id)
        .bind(&p.content)
        .bind(&p.author.id)
        .bind(&p.author.full_name)
        .bind(&p.author.avatar_url)
        .bind(p.created_on)
        .bind(p.updated_on)
        .bind(serde_json::to_value(&p.media).unwrap_or_default())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Content edits touch only the canonical row. Feed entries are pointers,
    /// so readers pick the new content up on the next query.
    pub async fn update_content(&self, id: &str, content: &str) -> Result<()> {
        sqlx::query("UPDATE publications SET content = $2, updated_on = now() WHERE id = $1")
            .bind(id)
            .bind(content)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM publications WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Publication>> {
        let row = sqlx::query_as::<_, PublicationRow>("SELECT * FROM publications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(PublicationRow::into_publication).transpose()
    }

    /// One page of an author's publications, newest first. `before` is the
    /// (created_on, id) of the last row on the previous page; authors can
    /// have unbounded histories so backfill walks this in pages.
    pub async fn find_by_author(
        &self,
        author: &str,
        before: Option<(DateTime<Utc>, String)>,
        limit: i64,
    ) -> Result<Vec<Publication>> {
        let rows = match before {
            Some((created_on, id)) => {
                sqlx::query_as::<_, PublicationRow>(
                    r#"
                    SELECT * FROM publications
                    WHERE author_id = $1 AND (created_on, id) < ($2, $3)
                    ORDER BY created_on DESC, id DESC
                    LIMIT $4
                    "#,
                )
                .bind(author)
                .bind(created_on)
                .bind(id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, PublicationRow>(
                    r#"
                    SELECT * FROM publications
                    WHERE author_id = $1
                    ORDER BY created_on DESC, id DESC
                    LIMIT $2
                    "#,
                )
                .bind(author)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(PublicationRow::into_publication).collect()
    }

    /// Resolve a set of ids, newest first. Ids missing from the catalog are
    /// silently dropped; the feed reader relies on that to never serve a
    /// dangling pointer.
    pub async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Publication>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query_as::<_, PublicationRow>(
            r#"
            SELECT * FROM publications
            WHERE id = ANY($1)
            ORDER BY created_on DESC, id DESC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(PublicationRow::into_publication).collect()
    }

    /// Drop the whole catalog. Used by the migrator before a full resync.
    pub async fn clear(&self) -> Result<()> {
        let res = sqlx::query("DELETE FROM publications")
            .execute(&self.pool)
            .await?;

        debug!(deleted = res.rows_affected(), "Publication catalog cleared");
        Ok(())
    }
}
