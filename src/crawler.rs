use crate::freshness::FreshnessPolicy;
use crate::report::{BatchReport, IngestEvent};
use crate::source::FeedSource;
use crate::store::{EntryStore, PutOutcome};
use crate::timestamp::TimestampNormalizer;
use crate::types::{FeedEntry, FeedRecord};
use chrono::{NaiveDateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Polls one notifier's feeds and records every fresh entry once.
pub struct Crawler {
    store: Arc<dyn EntryStore>,
    policy: FreshnessPolicy,
}

impl Crawler {
    pub fn new(store: Arc<dyn EntryStore>, policy: FreshnessPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> FreshnessPolicy {
        self.policy
    }

    pub async fn run(&self, notifier_name: &str, feeds: &BTreeMap<String, Arc<dyn FeedSource>>) -> BatchReport {
        self.run_at(Utc::now().naive_utc(), notifier_name, feeds).await
    }

    /// Same as [`Crawler::run`] with an explicit "now".
    ///
    /// Never fails: feed and entry problems end up in the report.
    pub async fn run_at(
        &self,
        now: NaiveDateTime,
        notifier_name: &str,
        feeds: &BTreeMap<String, Arc<dyn FeedSource>>,
    ) -> BatchReport {
        let mut report = BatchReport::new(notifier_name);
        let span = info_span!("crawl", notifier = %notifier_name, run_id = %report.run_id);

        async {
            info!("Crawling {} feeds", feeds.len());

            for (category, source) in feeds {
                self.crawl_feed(now, notifier_name, category, source.as_ref(), &mut report)
                    .await;
            }

            report.finish();
            info!("Crawl finished: {}", report.summary());
        }
        .instrument(span)
        .await;

        report
    }

    async fn crawl_feed(
        &self,
        now: NaiveDateTime,
        notifier_name: &str,
        category: &str,
        source: &dyn FeedSource,
        report: &mut BatchReport,
    ) {
        let raw_updated = match source.feed_updated_at().await {
            Ok(raw) => raw,
            Err(e) => {
                error!("Failed to fetch feed {} ({}): {}", category, source.url(), e);
                report.record(IngestEvent::FeedFailed {
                    category: category.to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        let updated = match TimestampNormalizer::parse(&raw_updated) {
            Ok(ts) => ts,
            Err(e) => {
                warn!("Feed {} has an unreadable update time: {}", category, e);
                report.record(IngestEvent::MalformedFeedTimestamp {
                    category: category.to_string(),
                    raw: raw_updated,
                });
                return;
            }
        };

        info!("RSS {} updated {}", category, updated);
        if !self.policy.is_fresh(&updated, now) {
            info!("Skipping RSS {}: not updated within {} days", category, self.policy.window_days());
            report.record(IngestEvent::SkippedFeed {
                category: category.to_string(),
                updated_at: updated.to_iso_string(),
            });
            return;
        }

        let entries = match source.entries().await {
            Ok(entries) => entries,
            Err(e) => {
                error!("Failed to read entries of feed {} ({}): {}", category, source.url(), e);
                report.record(IngestEvent::FeedFailed {
                    category: category.to_string(),
                    reason: e.to_string(),
                });
                return;
            }
        };

        debug!("Feed {} has {} entries", category, entries.len());
        for entry in &entries {
            let event = self.ingest_entry(now, notifier_name, category, entry).await;
            report.record(event);
        }
    }

    async fn ingest_entry(
        &self,
        now: NaiveDateTime,
        notifier_name: &str,
        category: &str,
        entry: &FeedEntry,
    ) -> IngestEvent {
        let published = match TimestampNormalizer::parse(&entry.published_raw) {
            Ok(ts) => ts,
            Err(e) => {
                warn!("Skipping entry {} ({}): {}", entry.title, entry.link, e);
                return IngestEvent::MalformedTimestamp {
                    category: category.to_string(),
                    url: entry.link.clone(),
                    title: entry.title.clone(),
                    raw: entry.published_raw.clone(),
                };
            }
        };

        if !self.policy.is_fresh(&published, now) {
            info!("Old entry, skipping: {}", entry.title);
            return IngestEvent::SkippedEntry {
                category: category.to_string(),
                url: entry.link.clone(),
                title: entry.title.clone(),
            };
        }

        let record = FeedRecord::new(entry, category, notifier_name, &published);
        match self.store.put(&record).await {
            PutOutcome::Inserted => {
                info!("Stored entry {} ({})", record.title(), record.url());
                IngestEvent::Inserted {
                    category: category.to_string(),
                    url: record.url().to_string(),
                }
            }
            PutOutcome::Duplicate => {
                info!("Duplicate item put: {}", record.title());
                IngestEvent::Duplicate {
                    category: category.to_string(),
                    url: record.url().to_string(),
                }
            }
            PutOutcome::Failed(reason) => {
                error!("Failed to store entry {} ({}): {}", record.title(), record.url(), reason);
                IngestEvent::Failed {
                    category: category.to_string(),
                    url: record.url().to_string(),
                    title: record.title().to_string(),
                    reason,
                }
            }
        }
    }
}
