pub mod config;
pub mod crawler;
pub mod event;
pub mod freshness;
pub mod report;
pub mod source;
pub mod store;
pub mod timestamp;
pub mod types;

pub use types::*;
pub use config::CrawlerConfig;
pub use crawler::Crawler;
pub use event::NotifierConfig;
pub use freshness::{FreshnessPolicy, DEFAULT_WINDOW_DAYS};
pub use report::{BatchReport, IngestEvent};
pub use source::{FeedSource, HttpFeedSource};
pub use store::{EntryStore, InMemoryEntryStore, PgEntryStore, PutOutcome};
pub use timestamp::{NormalizedTimestamp, TimestampNormalizer};
