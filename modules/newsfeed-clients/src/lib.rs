//! Clients for the authoritative upstream services the migrator resyncs
//! from. Each service sits behind a trait so the migrator can be exercised
//! against fixtures.

pub mod content;
pub mod error;
pub mod profiles;
pub mod relations;

pub use content::ContentClient;
pub use error::{ClientError, Result};
pub use profiles::{Profile, ProfilesClient};
pub use relations::RelationsClient;

use async_trait::async_trait;
use newsfeed_common::Publication;

/// Paginated directory of all known user profiles.
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn profiles(&self, skip: usize, take: usize) -> Result<Vec<Profile>>;
}

/// The relationship service: who a user's sources are.
#[async_trait]
pub trait RelationsDirectory: Send + Sync {
    /// Accepted friends of `user`, paginated.
    async fn friends(&self, user: &str, skip: usize, take: usize) -> Result<Vec<String>>;

    /// Users `user` has sent a still-pending friend request to, paginated.
    async fn outgoing_requests(&self, user: &str, skip: usize, take: usize)
        -> Result<Vec<String>>;
}

/// The content service: the authoritative publication stream.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// One page of publications plus the cursor for the next page (None on
    /// the last page).
    async fn publications(
        &self,
        cursor: Option<&str>,
        take: usize,
    ) -> Result<(Vec<Publication>, Option<String>)>;
}
