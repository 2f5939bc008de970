use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use serde::de::DeserializeOwned;
use tracing::info;

use newsfeed_bus::{EventBus, HandleError, Handler};
use newsfeed_common::Publication;
use newsfeed_store::{FeedIndex, FollowGraph, PublicationCatalog, StoreError};

use crate::events::{FriendDeleted, RequestApproved, RequestCancelled, RequestSent};

pub const TOPIC_PUBLICATION_CREATED: &str = "publications.created";
pub const TOPIC_PUBLICATION_UPDATED: &str = "publications.updated";
pub const TOPIC_PUBLICATION_DELETED: &str = "publications.deleted";
pub const TOPIC_REQUEST_SENT: &str = "friends.requestsent";
pub const TOPIC_REQUEST_APPROVED: &str = "friends.requestapproved";
pub const TOPIC_REQUEST_CANCELLED: &str = "friends.requestcancelled";
pub const TOPIC_FRIEND_DELETED: &str = "friends.deleted";

/// Publication events fan out to an unbounded follower set.
const PUBLICATION_TIMEOUT: Duration = Duration::from_secs(30);
/// Friend events touch one edge plus one author's history.
const FRIEND_TIMEOUT: Duration = Duration::from_secs(5);

/// The write side of the feed: every mutation of the catalog, the follow
/// graph, and the feed index enters through one of these handlers. All of
/// them are idempotent, so redelivery and reordering are safe.
#[derive(Clone)]
pub struct EventHandlers {
    catalog: PublicationCatalog,
    graph: FollowGraph,
    feed: FeedIndex,
}

fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, HandleError> {
    serde_json::from_slice(body).map_err(|e| HandleError::Malformed(e.to_string()))
}

async fn bounded(
    limit: Duration,
    fut: impl std::future::Future<Output = Result<(), StoreError>>,
) -> Result<(), HandleError> {
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(HandleError::Transient(e.into())),
        Err(_) => Err(HandleError::Transient(anyhow::anyhow!(
            "handler exceeded {limit:?}"
        ))),
    }
}

impl EventHandlers {
    pub fn new(catalog: PublicationCatalog, graph: FollowGraph, feed: FeedIndex) -> Self {
        Self { catalog, graph, feed }
    }

    /// Record the publication, then push a pointer into every follower's
    /// feed. Catalog-first: a reordered update event for the same id then
    /// finds a row to land on.
    pub async fn publication_created(&self, p: Publication) -> Result<(), StoreError> {
        self.catalog.put(&p).await?;
        self.feed.fan_out_publication(&p).await?;
        Ok(())
    }

    /// Content edits only touch the canonical row; feed entries are pointers
    /// and need no rewrite.
    pub async fn publication_updated(&self, p: Publication) -> Result<(), StoreError> {
        self.catalog.update_content(&p.id, &p.content).await
    }

    pub async fn publication_deleted(&self, p: Publication) -> Result<(), StoreError> {
        self.catalog.delete(&p.id).await?;
        self.feed.remove_publication(&p.id).await?;
        Ok(())
    }

    /// A follow edge appeared: record it, then backfill the source's whole
    /// history into the follower's feed.
    pub async fn follow_created(&self, user: &str, source: &str) -> Result<(), StoreError> {
        self.graph.add_edge(user, source).await?;
        self.feed.backfill_source(user, source, &self.catalog).await?;
        Ok(())
    }

    /// A follow edge disappeared: remove it and every feed entry it fed.
    pub async fn follow_removed(&self, user: &str, source: &str) -> Result<(), StoreError> {
        self.graph.remove_edge(user, source).await?;
        self.feed.remove_source(user, source).await?;
        Ok(())
    }

    /// Bind all seven topic handlers on `bus` under one subscription name.
    pub async fn register_all(&self, bus: &dyn EventBus, subscription: &str) -> anyhow::Result<()> {
        let h = self.clone();
        let created: Handler = Arc::new(move |body| {
            let h = h.clone();
            async move {
                let p: Publication = decode(&body)?;
                bounded(PUBLICATION_TIMEOUT, h.publication_created(p)).await
            }
            .boxed()
        });
        bus.listen_one(TOPIC_PUBLICATION_CREATED, subscription, created).await?;
        info!(topic = TOPIC_PUBLICATION_CREATED, "Subscribed");

        let h = self.clone();
        let updated: Handler = Arc::new(move |body| {
            let h = h.clone();
            async move {
                let p: Publication = decode(&body)?;
                bounded(PUBLICATION_TIMEOUT, h.publication_updated(p)).await
            }
            .boxed()
        });
        bus.listen_one(TOPIC_PUBLICATION_UPDATED, subscription, updated).await?;
        info!(topic = TOPIC_PUBLICATION_UPDATED, "Subscribed");

        let h = self.clone();
        let deleted: Handler = Arc::new(move |body| {
            let h = h.clone();
            async move {
                let p: Publication = decode(&body)?;
                bounded(PUBLICATION_TIMEOUT, h.publication_deleted(p)).await
            }
            .boxed()
        });
        bus.listen_one(TOPIC_PUBLICATION_DELETED, subscription, deleted).await?;
        info!(topic = TOPIC_PUBLICATION_DELETED, "Subscribed");

        let h = self.clone();
        let sent: Handler = Arc::new(move |body| {
            let h = h.clone();
            async move {
                let e: RequestSent = decode(&body)?;
                bounded(FRIEND_TIMEOUT, h.follow_created(&e.from_user, &e.to_user)).await
            }
            .boxed()
        });
        bus.listen_one(TOPIC_REQUEST_SENT, subscription, sent).await?;
        info!(topic = TOPIC_REQUEST_SENT, "Subscribed");

        let h = self.clone();
        let approved: Handler = Arc::new(move |body| {
            let h = h.clone();
            async move {
                let e: RequestApproved = decode(&body)?;
                bounded(FRIEND_TIMEOUT, h.follow_created(&e.user, &e.requester)).await
            }
            .boxed()
        });
        bus.listen_one(TOPIC_REQUEST_APPROVED, subscription, approved).await?;
        info!(topic = TOPIC_REQUEST_APPROVED, "Subscribed");

        let h = self.clone();
        let cancelled: Handler = Arc::new(move |body| {
            let h = h.clone();
            async move {
                let e: RequestCancelled = decode(&body)?;
                bounded(FRIEND_TIMEOUT, h.follow_removed(&e.from_user, &e.to_user)).await
            }
            .boxed()
        });
        bus.listen_one(TOPIC_REQUEST_CANCELLED, subscription, cancelled).await?;
        info!(topic = TOPIC_REQUEST_CANCELLED, "Subscribed");

        let h = self.clone();
        let friend_deleted: Handler = Arc::new(move |body| {
            let h = h.clone();
            async move {
                let e: FriendDeleted = decode(&body)?;
                bounded(FRIEND_TIMEOUT, h.follow_removed(&e.user, &e.friend)).await
            }
            .boxed()
        });
        bus.listen_one(TOPIC_FRIEND_DELETED, subscription, friend_deleted).await?;
        info!(topic = TOPIC_FRIEND_DELETED, "Subscribed");

        Ok(())
    }
}
