pub mod config;
pub mod types;

pub use config::{BusKind, Config};
pub use types::{Author, Media, Publication};
