pub mod http;

pub use http::{sources_for, HttpFeedSource};

use crate::types::{FeedEntry, Result};
use async_trait::async_trait;

/// A feed the crawler can read, independent of how it is fetched or parsed.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Where the feed lives, for logging.
    fn url(&self) -> &str;

    /// The feed's own "last updated" timestamp, unparsed.
    async fn feed_updated_at(&self) -> Result<String>;

    /// Entries in the order the feed lists them.
    async fn entries(&self) -> Result<Vec<FeedEntry>>;
}
