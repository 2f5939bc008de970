use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use newsfeed_api::{router, AppState};
use newsfeed_clients::{ContentClient, ProfilesClient, RelationsClient};
use newsfeed_common::Config;
use newsfeed_migrate::Migrator;
use newsfeed_store::{FeedIndex, FeedReader, FollowGraph, PublicationCatalog};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await?;
    newsfeed_store::migrate(&pool).await?;

    let catalog = PublicationCatalog::new(pool.clone());
    let graph = FollowGraph::new(pool.clone());
    let feed = FeedIndex::new(pool);

    let http = reqwest::Client::new();
    let migrator = Arc::new(Migrator::new(
        Arc::new(ProfilesClient::new(config.profiles_address.clone(), http.clone())),
        Arc::new(RelationsClient::new(config.profiles_address.clone(), http.clone())),
        Arc::new(ContentClient::new(config.content_address.clone(), http)),
        catalog.clone(),
        graph,
        feed.clone(),
    ));

    let state = Arc::new(AppState {
        reader: FeedReader::new(feed, catalog),
        migrator,
    });

    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    info!("News feed API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
