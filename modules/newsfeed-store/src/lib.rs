pub mod catalog;
pub mod error;
pub mod feed;
pub mod graph;
pub mod migrate;
pub mod reader;

pub use catalog::PublicationCatalog;
pub use error::{Result, StoreError};
pub use feed::FeedIndex;
pub use graph::FollowGraph;
pub use migrate::migrate;
pub use reader::{FeedPage, FeedReader, DEFAULT_TAKE, MAX_TAKE};
