use std::sync::Arc;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use tracing_subscriber::EnvFilter;

use newsfeed_bus::{EventBus, InMemoryBus, NullBus};
use newsfeed_common::{BusKind, Config};
use newsfeed_listener::EventHandlers;
use newsfeed_store::{FeedIndex, FollowGraph, PublicationCatalog};

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

    let handlers = EventHandlers::new(
        PublicationCatalog::new(pool.clone()),
        FollowGraph::new(pool.clone()),
        FeedIndex::new(pool),
    );

    let bus: Arc<dyn EventBus> = match config.bus_kind {
        BusKind::Memory => Arc::new(InMemoryBus::default()),
        BusKind::Null => Arc::new(NullBus),
    };
    handlers.register_all(bus.as_ref(), &config.subscription).await?;

    info!("Listener started");
    tokio::signal::ctrl_c().await?;
    info!("Shutting down");
    Ok(())
}
