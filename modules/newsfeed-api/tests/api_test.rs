//! HTTP-level tests for the read API: the X-Cursor paging contract and the
//! error body on store failure. The error-path test needs no database; the
//! paging tests require Postgres and are skipped unless DATABASE_TEST_URL
//! is set.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use newsfeed_api::{router, AppState};
use newsfeed_clients::{ContentClient, ProfilesClient, RelationsClient};
use newsfeed_common::{Author, Publication};
use newsfeed_migrate::Migrator;
use newsfeed_store::{FeedIndex, FeedReader, FollowGraph, PublicationCatalog};

/// Serve the app on an ephemeral port and return its address.
async fn serve(pool: PgPool) -> SocketAddr {
    let catalog = PublicationCatalog::new(pool.clone());
    let graph = FollowGraph::new(pool.clone());
    let feed = FeedIndex::new(pool);

    // Upstream clients point nowhere; these tests never trigger a migration.
    let http = reqwest::Client::new();
    let migrator = Arc::new(Migrator::new(
        Arc::new(ProfilesClient::new("http://localhost:1", http.clone())),
        Arc::new(RelationsClient::new("http://localhost:1", http.clone())),
        Arc::new(ContentClient::new("http://localhost:1", http)),
        catalog.clone(),
        graph,
        feed.clone(),
    ));

    let state = Arc::new(AppState {
        reader: FeedReader::new(feed, catalog),
        migrator,
    });

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    addr
}

async fn test_pool() -> Option<PgPool> {
    let url = std::env::var("DATABASE_TEST_URL").ok()?;
    let pool = PgPool::connect(&url).await.ok()?;
    newsfeed_store::migrate(&pool).await.ok()?;
    Some(pool)
}

fn publication(id: &str, author: &str, minutes: i64) -> Publication {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        + chrono::Duration::minutes(minutes);
    Publication {
        id: id.to_string(),
        content: format!("post {id}"),
        author: Author {
            id: author.to_string(),
            full_name: "Test Author".to_string(),
            avatar_url: String::new(),
        },
        created_on: at,
        updated_on: at,
        media: Vec::new(),
    }
}

#[tokio::test]
async fn non_empty_page_carries_the_next_cursor_header() {
    let Some(pool) = test_pool().await else { return };

    let catalog = PublicationCatalog::new(pool.clone());
    let graph = FollowGraph::new(pool.clone());
    let feed = FeedIndex::new(pool.clone());

    graph.add_edge("api-u1", "api-src").await.unwrap();
    for (id, minutes) in [("api-p1", 0), ("api-p2", 1)] {
        let p = publication(id, "api-src", minutes);
        catalog.put(&p).await.unwrap();
        feed.fan_out_publication(&p).await.unwrap();
    }

    let addr = serve(pool).await;
    let client = reqwest::Client::new();

    let resp = client
        .get(format!("http://{addr}/api-u1?take=1"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let cursor = resp
        .headers()
        .get("X-Cursor")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert_eq!(cursor.as_deref(), Some("api-p2"));

    let page: Vec<Publication> = resp.json().await.unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id, "api-p2");

    // The cursor walks to the older entry.
    let resp = client
        .get(format!("http://{addr}/api-u1?take=1&cursor=api-p2"))
        .send()
        .await
        .unwrap();
    let page: Vec<Publication> = resp.json().await.unwrap();
    assert_eq!(page[0].id, "api-p1");
}

#[tokio::test]
async fn empty_page_has_no_cursor_header() {
    let Some(pool) = test_pool().await else { return };
    let addr = serve(pool).await;

    let resp = reqwest::get(format!("http://{addr}/api-nobody"))
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert!(resp.headers().get("X-Cursor").is_none());

    let page: Vec<Publication> = resp.json().await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn store_failure_returns_500_with_the_error_text() {
    // A lazy pool with nothing behind it and a short acquire timeout makes
    // every query fail fast.
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://localhost:1/unreachable")
        .unwrap();
    let addr = serve(pool).await;

    let resp = reqwest::get(format!("http://{addr}/api-u1")).await.unwrap();
    assert_eq!(resp.status(), 500);

    let body = resp.text().await.unwrap();
    assert!(
        body.contains("Database error"),
        "body should carry the store error text, got: {body}"
    );
}

#[tokio::test]
async fn migration_triggers_are_accepted() {
    let pool = PgPoolOptions::new()
        .acquire_timeout(Duration::from_millis(200))
        .connect_lazy("postgres://localhost:1/unreachable")
        .unwrap();
    let addr = serve(pool).await;

    let client = reqwest::Client::new();
    for path in ["/migrator/users", "/migrator/users/api-u1", "/migrator/publications"] {
        let resp = client
            .post(format!("http://{addr}{path}"))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 202, "{path}");
    }
}
