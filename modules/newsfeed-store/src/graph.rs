use sqlx::PgPool;
use tracing::debug;

use crate::error::Result;

/// Canonical store of directed "user follows source" edges. Read by the
/// fan-out path to find followers; never exposed to clients directly.
#[derive(Clone)]
pub struct FollowGraph {
    pool: PgPool,
}

impl FollowGraph {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert-if-absent. The edge is only ever used existentially, but the
    /// primary key keeps storage bounded under duplicate delivery.
    pub async fn add_edge(&self, user: &str, source: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO follow_edges (user_id, source_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user)
        .bind(source)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Batch edge insert, one statement regardless of batch size.
    pub async fn add_edges(&self, user: &str, sources: &[String]) -> Result<()> {
        if sources.is_empty() {
            return Ok(());
        }

        sqlx::query(
            r#"
            INSERT INTO follow_edges (user_id, source_id)
            SELECT $1, unnest($2::text[])
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user)
        .bind(sources)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn remove_edge(&self, user: &str, source: &str) -> Result<()> {
        sqlx::query("DELETE FROM follow_edges WHERE user_id = $1 AND source_id = $2")
            .bind(user)
            .bind(source)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Drop every edge a user holds. Used by the migrator immediately before
    /// a full re-backfill for that user; not reachable from live events.
    pub async fn remove_all_for_user(&self, user: &str) -> Result<()> {
        let res = sqlx::query("DELETE FROM follow_edges WHERE user_id = $1")
            .bind(user)
            .execute(&self.pool)
            .await?;

        debug!(user, deleted = res.rows_affected(), "Follow edges reset");
        Ok(())
    }

    /// All users whose feed includes `source`'s publications.
    pub async fn followers_of(&self, source: &str) -> Result<Vec<String>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT user_id FROM follow_edges WHERE source_id = $1 ORDER BY user_id",
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn edge_exists(&self, user: &str, source: &str) -> Result<bool> {
        let row = sqlx::query_scalar::<_, i64>(
            "SELECT count(*) FROM follow_edges WHERE user_id = $1 AND source_id = $2",
        )
        .bind(user)
        .bind(source)
        .fetch_one(&self.pool)
        .await?;

        Ok(row > 0)
    }
}
