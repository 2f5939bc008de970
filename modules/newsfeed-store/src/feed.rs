use sqlx::PgPool;
use tracing::{debug, info};

use newsfeed_common::Publication;

use crate::catalog::PublicationCatalog;
use crate::error::Result;

/// Catalog pages consumed per round trip while backfilling a new follow edge.
const BACKFILL_PAGE: i64 = 100;

/// The denormalized, per-user feed index. Fan-out-on-write: every
/// publication-lifecycle and follow-lifecycle event lands here eagerly so
/// reads stay cheap cursor scans.
///
/// Entries are pointers, never copies. Content edits are served by re-reading
/// the catalog at query time; only the pointer and order key are stable.
#[derive(Clone)]
pub struct FeedIndex {
    pool: PgPool,
}

impl FeedIndex {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fan a new publication out to every existing follower of its author.
    /// One bulk insert over the follow graph; zero followers is a no-op.
    /// Replays of the same event hit the primary key and change nothing.
    pub async fn fan_out_publication(&self, p: &Publication) -> Result<u64> {
        let res = sqlx::query(
            r#"
            INSERT INTO feed_entries (user_id, source_id, publication_id, order_key)
            SELECT user_id, $1, $2, $3
            FROM follow_edges
            WHERE source_id = $1
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(&p.author.id)
        .bind(&p.id)
        .bind(p.created_on)
        .execute(&self.pool)
        .await?;

        debug!(
            publication = p.id.as_str(),
            author = p.author.id.as_str(),
            entries = res.rows_affected(),
            "Publication fanned out"
        );
        Ok(res.rows_affected())
    }

    /// The backfill half of fan-out-on-write: a new follower sees the
    /// source's entire existing history, not just future posts. Walks the
    /// catalog in pages (author histories are unbounded) and bulk-inserts
    /// one page of entries per round trip.
    pub async fn backfill_source(
        &self,
        user: &str,
        source: &str,
        catalog: &PublicationCatalog,
    ) -> Result<u64> {
        let mut inserted = 0u64;
        let mut before = None;

        loop {
            let page = catalog.find_by_author(source, before.clone(), BACKFILL_PAGE).await?;
            let Some(last) = page.last() else {
                break;
            };

            inserted += self.insert_entries(user, source, &page).await?;
            before = Some((last.created_on, last.id.clone()));

            if (page.len() as i64) < BACKFILL_PAGE {
                break;
            }
        }

        if inserted > 0 {
            info!(user, source, inserted, "Feed backfilled for new follow edge");
        }
        Ok(inserted)
    }

    async fn insert_entries(
        &self,
        user: &str,
        source: &str,
        publications: &[Publication],
    ) -> Result<u64> {
        let ids: Vec<String> = publications.iter().map(|p| p.id.clone()).collect();
        let orders: Vec<chrono::DateTime<chrono::Utc>> =
            publications.iter().map(|p| p.created_on).collect();

        let res = sqlx::query(
            r#"
            INSERT INTO feed_entries (user_id, source_id, publication_id, order_key)
            SELECT $1, $2, t.pid, t.ord
            FROM unnest($3::text[], $4::timestamptz[]) AS t(pid, ord)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user)
        .bind(source)
        .bind(&ids)
        .bind(&orders)
        .execute(&self.pool)
        .await?;

        Ok(res.rows_affected())
    }

    /// Bulk-delete every entry `source` contributed to `user`'s feed.
    /// The redundant source column exists exactly for this statement.
    pub async fn remove_source(&self, user: &str, source: &str) -> Result<u64> {
        let res = sqlx::query("DELETE FROM feed_entries WHERE user_id = $1 AND source_id = $2")
            .bind(user)
            .bind(source)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected())
    }

    /// Bulk-delete a publication from every follower's feed.
    pub async fn remove_publication(&self, publication_id: &str) -> Result<u64> {
        let res = sqlx::query("DELETE FROM feed_entries WHERE publication_id = $1")
            .bind(publication_id)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected())
    }

    /// Drop a user's whole feed. The migrator resets a user this way before
    /// re-deriving their edges, keeping "entry implies edge" true across a
    /// resync.
    pub async fn remove_user(&self, user: &str) -> Result<u64> {
        let res = sqlx::query("DELETE FROM feed_entries WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;

        Ok(res.rows_affected())
    }

    /// Drop the whole index. Used by the migrator before a full publication
    /// resync.
    pub async fn clear(&self) -> Result<()> {
        let res = sqlx::query("DELETE FROM feed_entries")
            .execute(&self.pool)
            .await?;

        debug!(deleted = res.rows_affected(), "Feed index cleared");
        Ok(())
    }

    /// One page of publication ids for a user's feed, newest first, ordered
    /// by (order_key DESC, publication_id DESC). `cursor` is the publication
    /// id of the last item on the previous page; the scan resumes strictly
    /// after that entry. An unknown cursor falls back to the first page.
    pub async fn find_page(
        &self,
        user: &str,
        cursor: Option<&str>,
        take: i64,
    ) -> Result<Vec<String>> {
        let boundary = match cursor {
            Some(c) if !c.is_empty() => {
                sqlx::query_scalar::<_, chrono::DateTime<chrono::Utc>>(
                    "SELECT order_key FROM feed_entries WHERE user_id = $1 AND publication_id = $2",
                )
                .bind(user)
                .bind(c)
                .fetch_optional(&self.pool)
                .await?
                .map(|order| (order, c.to_string()))
            }
            _ => None,
        };

        let ids = match boundary {
            Some((order, id)) => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT publication_id FROM feed_entries
                    WHERE user_id = $1 AND (order_key, publication_id) < ($2, $3)
                    ORDER BY order_key DESC, publication_id DESC
                    LIMIT $4
                    "#,
                )
                .bind(user)
                .bind(order)
                .bind(id)
                .bind(take)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_scalar::<_, String>(
                    r#"
                    SELECT publication_id FROM feed_entries
                    WHERE user_id = $1
                    ORDER BY order_key DESC, publication_id DESC
                    LIMIT $2
                    "#,
                )
                .bind(user)
                .bind(take)
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(ids)
    }
}
