use sqlx::PgPool;
use tracing::info;

use crate::error::Result;

/// Run idempotent schema migrations: tables and indexes.
/// Safe to call on every startup.
pub async fn migrate(pool: &PgPool) -> Result<()> {
    info!("Running schema migrations...");

    let statements = [
        // Canonical publication catalog. The author snapshot is denormalized
        // onto the row so reads never call the profile service.
        r#"
        CREATE TABLE IF NOT EXISTS publications (
            id            TEXT        PRIMARY KEY,
            content       TEXT        NOT NULL,
            author_id     TEXT        NOT NULL,
            author_name   TEXT        NOT NULL,
            author_avatar TEXT        NOT NULL,
            created_on    TIMESTAMPTZ NOT NULL,
            updated_on    TIMESTAMPTZ NOT NULL,
            media         JSONB       NOT NULL DEFAULT '[]'
        )
        "#,
        // Keyset scans by author during follow backfill.
        r#"
        CREATE INDEX IF NOT EXISTS publications_author_idx
            ON publications (author_id, created_on DESC, id DESC)
        "#,
        // Follow graph. Composite primary key gives exactly-one-row
        // semantics per (user, source) pair.
        r#"
        CREATE TABLE IF NOT EXISTS follow_edges (
            user_id   TEXT NOT NULL,
            source_id TEXT NOT NULL,
            PRIMARY KEY (user_id, source_id)
        )
        "#,
        // Publication fan-out looks edges up by source.
        r#"
        CREATE INDEX IF NOT EXISTS follow_edges_source_idx
            ON follow_edges (source_id)
        "#,
        // Materialized feed index: pointers into the catalog. The composite
        // primary key makes fan-out replay-safe (ON CONFLICT DO NOTHING).
        r#"
        CREATE TABLE IF NOT EXISTS feed_entries (
            user_id        TEXT        NOT NULL,
            source_id      TEXT        NOT NULL,
            publication_id TEXT        NOT NULL,
            order_key      TIMESTAMPTZ NOT NULL,
            PRIMARY KEY (user_id, source_id, publication_id)
        )
        "#,
        // Range scans for cursor pagination.
        r#"
        CREATE INDEX IF NOT EXISTS feed_entries_user_order_idx
            ON feed_entries (user_id, order_key DESC, publication_id DESC)
        "#,
        // Cascade deletes when a publication is removed.
        r#"
        CREATE INDEX IF NOT EXISTS feed_entries_publication_idx
            ON feed_entries (publication_id)
        "#,
    ];

    for sql in &statements {
        sqlx::query(sql).execute(pool).await?;
    }

    info!("Schema migration complete");
    Ok(())
}
