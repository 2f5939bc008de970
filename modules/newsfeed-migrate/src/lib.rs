//! Reconciliation against the authoritative upstream services. The live
//! event handlers keep the feed current; the migrator rebuilds it from
//! scratch when state has drifted (missed events, schema changes, a fresh
//! deployment).
//!
//! Migration runs are fire-and-forget: failures are logged, never returned,
//! and a rerun repairs whatever a partial run left behind.

use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{error, info};

use newsfeed_clients::{ContentService, ProfileDirectory, RelationsDirectory};
use newsfeed_store::{FeedIndex, FollowGraph, PublicationCatalog};

/// Upstream page size for profiles, relations and publications.
const PAGE_SIZE: usize = 20;

pub struct Migrator {
    profiles: Arc<dyn ProfileDirectory>,
    relations: Arc<dyn RelationsDirectory>,
    content: Arc<dyn ContentService>,
    catalog: PublicationCatalog,
    graph: FollowGraph,
    feed: FeedIndex,
}

impl Migrator {
    pub fn new(
        profiles: Arc<dyn ProfileDirectory>,
        relations: Arc<dyn RelationsDirectory>,
        content: Arc<dyn ContentService>,
        catalog: PublicationCatalog,
        graph: FollowGraph,
        feed: FeedIndex,
    ) -> Self {
        Self { profiles, relations, content, catalog, graph, feed }
    }

    /// Resync the follow graph and feeds of every known user. Users within a
    /// page run concurrently; the next page is not fetched until the current
    /// one has fully settled.
    pub async fn migrate_users(&self) {
        let started = Instant::now();
        let mut skip = 0;
        let mut total = 0usize;

        loop {
            let page = match self.profiles.profiles(skip, PAGE_SIZE).await {
                Ok(page) => page,
                Err(e) => {
                    error!(error = %e, skip, "Profile page fetch failed, aborting user migration");
                    return;
                }
            };
            if page.is_empty() {
                break;
            }

            join_all(page.iter().map(|p| self.migrate_user(&p.id))).await;

            total += page.len();
            if page.len() < PAGE_SIZE {
                break;
            }
            skip += PAGE_SIZE;
        }

        info!(
            users = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "User migration finished"
        );
    }

    /// Resync one user: drop their edges and feed, then rebuild both from
    /// the relations service. Accepted friends and still-pending outgoing
    /// requests both count as follow edges, and every rebuilt edge re-runs
    /// the history backfill.
    pub async fn migrate_user(&self, user: &str) {
        if let Err(e) = self.resync_user(user).await {
            error!(user, error = %e, "User migration failed");
        }
    }

    async fn resync_user(&self, user: &str) -> anyhow::Result<()> {
        self.graph.remove_all_for_user(user).await?;
        self.feed.remove_user(user).await?;

        let mut skip = 0;
        loop {
            let friends = self.relations.friends(user, skip, PAGE_SIZE).await?;
            self.follow_all(user, &friends).await?;
            if friends.len() < PAGE_SIZE {
                break;
            }
            skip += PAGE_SIZE;
        }

        let mut skip = 0;
        loop {
            let outgoing = self.relations.outgoing_requests(user, skip, PAGE_SIZE).await?;
            self.follow_all(user, &outgoing).await?;
            if outgoing.len() < PAGE_SIZE {
                break;
            }
            skip += PAGE_SIZE;
        }

        Ok(())
    }

    async fn follow_all(&self, user: &str, sources: &[String]) -> anyhow::Result<()> {
        self.graph.add_edges(user, sources).await?;
        for source in sources {
            self.feed.backfill_source(user, source, &self.catalog).await?;
        }
        Ok(())
    }

    /// Rebuild the publication catalog from the content service. Clears the
    /// catalog and the feed index first, then fans every fetched publication
    /// back out over the current follow graph, so feeds come out of the run
    /// consistent rather than emptied.
    pub async fn migrate_publications(&self) {
        if let Err(e) = self.resync_publications().await {
            error!(error = %e, "Publication migration failed");
        }
    }

    async fn resync_publications(&self) -> anyhow::Result<()> {
        let started = Instant::now();

        self.feed.clear().await?;
        self.catalog.clear().await?;

        let mut cursor: Option<String> = None;
        let mut total = 0usize;
        loop {
            let (page, next) = self.content.publications(cursor.as_deref(), PAGE_SIZE).await?;
            for p in &page {
                self.catalog.put(p).await?;
                self.feed.fan_out_publication(p).await?;
            }
            total += page.len();

            match next {
                Some(next) if !page.is_empty() => cursor = Some(next),
                _ => break,
            }
        }

        info!(
            publications = total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Publication migration finished"
        );
        Ok(())
    }
}
