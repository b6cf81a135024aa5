use super::FeedSource;
use crate::event::NotifierConfig;
use crate::timestamp::{NormalizedTimestamp, TimestampNormalizer};
use crate::types::{CrawlerError, FeedEntry, FetchConfig, Result};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use feed_rs::parser;
use reqwest::Client;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;
use tracing::{debug, info};
use url::Url;

/// What a fetched document boils down to for the crawler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub updated_raw: Option<String>,
    pub entries: Vec<FeedEntry>,
}

/// RSS/Atom/JSON feed fetched over HTTP and parsed with feed-rs.
///
/// The document is downloaded at most once; both trait operations read the
/// cached copy.
pub struct HttpFeedSource {
    url: Url,
    client: Client,
    max_feed_size_bytes: u64,
    document: OnceCell<FetchedDocument>,
}

impl HttpFeedSource {
    pub fn new(url: Url, client: Client, config: &FetchConfig) -> Self {
        Self {
            url,
            client,
            max_feed_size_bytes: config.max_feed_size_bytes(),
            document: OnceCell::new(),
        }
    }

    async fn document(&self) -> Result<&FetchedDocument> {
        self.document.get_or_try_init(|| self.fetch()).await
    }

    async fn fetch(&self) -> Result<FetchedDocument> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", self.url);

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| self.fetch_error(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(self.fetch_error(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size_bytes {
                return Err(self.fetch_error(format!("feed too large: {} bytes", content_length)));
            }
        }

        let body = response.bytes().await.map_err(|e| self.fetch_error(e.to_string()))?;
        if body.len() as u64 > self.max_feed_size_bytes {
            return Err(self.fetch_error(format!("feed too large: {} bytes", body.len())));
        }

        let document = parse_document(&body).map_err(|e| self.fetch_error(e.to_string()))?;
        info!(
            "Fetched feed {} ({} bytes, {} entries) in {}ms",
            self.url,
            body.len(),
            document.entries.len(),
            start_time.elapsed().as_millis()
        );
        Ok(document)
    }

    fn fetch_error(&self, reason: String) -> CrawlerError {
        CrawlerError::FeedFetch {
            url: self.url.to_string(),
            reason,
        }
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn feed_updated_at(&self) -> Result<String> {
        self.document()
            .await?
            .updated_raw
            .clone()
            .ok_or_else(|| self.fetch_error("feed carries no timestamp".to_string()))
    }

    async fn entries(&self) -> Result<Vec<FeedEntry>> {
        Ok(self.document().await?.entries.clone())
    }
}

/// Parses raw feed bytes. Entries without a link are dropped.
///
/// Dates go through [`TimestampNormalizer`] inside feed-rs, so any offset in
/// the document is dropped rather than converted to UTC.
pub fn parse_document(content: &[u8]) -> Result<FetchedDocument> {
    let feed = parser::Builder::new()
        .timestamp_parser(offset_discarding_timestamp)
        .build()
        .parse(content)
        .map_err(|e| CrawlerError::FeedFetch {
            url: String::new(),
            reason: format!("failed to parse feed: {}", e),
        })?;

    let newest_entry = feed
        .entries
        .iter()
        .filter_map(|entry| entry.published.or(entry.updated))
        .max();
    let updated_raw = feed
        .updated
        .or(feed.published)
        .or(newest_entry)
        .map(render_timestamp);

    let mut entries = Vec::with_capacity(feed.entries.len());
    for entry in feed.entries {
        let Some(link) = entry.links.first().map(|l| l.href.clone()) else {
            debug!("Dropping entry without link: {}", entry.id);
            continue;
        };
        let title = entry.title.map(|t| t.content).unwrap_or_default();
        let published_raw = entry
            .published
            .or(entry.updated)
            .map(render_timestamp)
            .unwrap_or_default();

        entries.push(FeedEntry {
            link,
            title,
            published_raw,
        });
    }

    Ok(FetchedDocument { updated_raw, entries })
}

/// Wall-clock time as written, tagged UTC only because feed-rs wants a `DateTime<Utc>`.
fn offset_discarding_timestamp(text: &str) -> Option<DateTime<Utc>> {
    TimestampNormalizer::parse(text)
        .ok()
        .map(|ts| Utc.from_utc_datetime(&ts.as_naive()))
}

fn render_timestamp(dt: DateTime<Utc>) -> String {
    NormalizedTimestamp::from(dt.naive_utc()).to_iso_string()
}

pub fn build_client(config: &FetchConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&config.user_agent)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
        .build()?;
    Ok(client)
}

/// One HTTP source per configured category, sharing a single client.
pub fn sources_for(notifier: &NotifierConfig, config: &FetchConfig) -> Result<BTreeMap<String, Arc<dyn FeedSource>>> {
    let client = build_client(config)?;

    Ok(notifier
        .feeds_by_category
        .iter()
        .map(|(category, url)| {
            let source: Arc<dyn FeedSource> = Arc::new(HttpFeedSource::new(url.clone(), client.clone(), config));
            (category.clone(), source)
        })
        .collect())
}
