use newsfeed_common::Publication;

use crate::catalog::PublicationCatalog;
use crate::error::Result;
use crate::feed::FeedIndex;

/// Page size used when the caller sends nothing usable.
pub const DEFAULT_TAKE: i64 = 20;
/// Hard ceiling on page size.
pub const MAX_TAKE: i64 = 100;

/// One page of a user's feed.
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub publications: Vec<Publication>,
    /// Id of the last item on this page; absent when the page is empty.
    pub next_cursor: Option<String>,
}

/// Cursor-paginated query service over the feed index joined with the
/// catalog. The only externally exposed read path.
#[derive(Clone)]
pub struct FeedReader {
    feed: FeedIndex,
    catalog: PublicationCatalog,
}

impl FeedReader {
    pub fn new(feed: FeedIndex, catalog: PublicationCatalog) -> Self {
        Self { feed, catalog }
    }

    /// Newest-first page of publications for `user`. `cursor` is the id of
    /// the last item returned on the previous page (empty/None for the first
    /// page). Out-of-range `take` values are clamped, never rejected.
    ///
    /// The index holds pointers, so each page re-reads the canonical rows;
    /// a pointer whose publication has since been deleted simply drops out.
    pub async fn find_news(
        &self,
        user: &str,
        cursor: Option<&str>,
        take: i64,
    ) -> Result<FeedPage> {
        let take = clamp_take(take);

        let ids = self.feed.find_page(user, cursor, take).await?;
        if ids.is_empty() {
            return Ok(FeedPage { publications: Vec::new(), next_cursor: None });
        }

        let publications = self.catalog.find_by_ids(&ids).await?;
        let next_cursor = publications.last().map(|p| p.id.clone());

        Ok(FeedPage { publications, next_cursor })
    }
}

/// Zero, negative, and over-maximum page sizes all fall back to the default.
fn clamp_take(take: i64) -> i64 {
    if take <= 0 || take > MAX_TAKE {
        DEFAULT_TAKE
    } else {
        take
    }
}
