use crate::timestamp::NormalizedTimestamp;
use serde::{Deserialize, Serialize};

/// One content item as handed over by a feed source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub link: String,
    pub title: String,
    /// Timestamp exactly as the source provided it; normalized by the crawler.
    pub published_raw: String,
}

impl FeedEntry {
    pub fn new(link: impl Into<String>, title: impl Into<String>, published_raw: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            published_raw: published_raw.into(),
        }
    }
}

/// A persisted entry. Keyed by `url`, written once, never updated.
///
/// The only constructor takes a [`NormalizedTimestamp`], so `pubtime` can never
/// hold a raw source string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedRecord {
    url: String,
    notifier_name: String,
    title: String,
    category: String,
    #[serde(rename = "pubtime")]
    pub_time: String,
}

impl FeedRecord {
    pub fn new(entry: &FeedEntry, category: &str, notifier_name: &str, published: &NormalizedTimestamp) -> Self {
        Self {
            url: entry.link.clone(),
            notifier_name: notifier_name.to_string(),
            title: entry.title.clone(),
            category: category.to_string(),
            pub_time: published.to_iso_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn notifier_name(&self) -> &str {
        &self.notifier_name
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn pub_time(&self) -> &str {
        &self.pub_time
    }
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("rss-crawler/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_seconds: 30,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    pub fn max_feed_size_bytes(&self) -> u64 {
        (self.max_feed_size_mb as u64) * 1024 * 1024
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CrawlerError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to fetch feed {url}: {reason}")]
    FeedFetch { url: String, reason: String },

    #[error("Malformed timestamp: {raw:?}")]
    MalformedTimestamp { raw: String },

    #[error("Invalid invocation event: {0}")]
    InvalidEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, CrawlerError>;
