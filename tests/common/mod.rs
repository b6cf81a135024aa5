use async_trait::async_trait;
use chrono::NaiveDateTime;
use rss_crawler::{CrawlerError, FeedEntry, FeedSource, Result};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn now() -> NaiveDateTime {
    NaiveDateTime::parse_from_str("2022-09-27T00:00:00", "%Y-%m-%dT%H:%M:%S").unwrap()
}

/// Feed source that replays canned data.
pub struct ScriptedFeedSource {
    url: String,
    updated: std::result::Result<String, String>,
    entries: std::result::Result<Vec<FeedEntry>, String>,
    entry_reads: AtomicUsize,
}

impl ScriptedFeedSource {
    pub fn new(url: &str, updated: &str, entries: Vec<FeedEntry>) -> Self {
        Self {
            url: url.to_string(),
            updated: Ok(updated.to_string()),
            entries: Ok(entries),
            entry_reads: AtomicUsize::new(0),
        }
    }

    pub fn unreachable(url: &str, reason: &str) -> Self {
        Self {
            url: url.to_string(),
            updated: Err(reason.to_string()),
            entries: Err(reason.to_string()),
            entry_reads: AtomicUsize::new(0),
        }
    }

    pub fn with_broken_entries(url: &str, updated: &str, reason: &str) -> Self {
        Self {
            url: url.to_string(),
            updated: Ok(updated.to_string()),
            entries: Err(reason.to_string()),
            entry_reads: AtomicUsize::new(0),
        }
    }

    pub fn entry_reads(&self) -> usize {
        self.entry_reads.load(Ordering::SeqCst)
    }

    fn error(&self, reason: &str) -> CrawlerError {
        CrawlerError::FeedFetch {
            url: self.url.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl FeedSource for ScriptedFeedSource {
    fn url(&self) -> &str {
        &self.url
    }

    async fn feed_updated_at(&self) -> Result<String> {
        self.updated.clone().map_err(|reason| self.error(&reason))
    }

    async fn entries(&self) -> Result<Vec<FeedEntry>> {
        self.entry_reads.fetch_add(1, Ordering::SeqCst);
        self.entries.clone().map_err(|reason| self.error(&reason))
    }
}

pub fn entry(link: &str, title: &str, published: &str) -> FeedEntry {
    FeedEntry::new(link, title, published)
}

pub fn feeds(sources: Vec<(&str, Arc<ScriptedFeedSource>)>) -> BTreeMap<String, Arc<dyn FeedSource>> {
    sources
        .into_iter()
        .map(|(category, source)| {
            let source: Arc<dyn FeedSource> = source;
            (category.to_string(), source)
        })
        .collect()
}
