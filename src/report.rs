use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Something that happened to a feed or an entry during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestEvent {
    FeedFailed { category: String, reason: String },
    MalformedFeedTimestamp { category: String, raw: String },
    SkippedFeed { category: String, updated_at: String },
    SkippedEntry { category: String, url: String, title: String },
    MalformedTimestamp { category: String, url: String, title: String, raw: String },
    Inserted { category: String, url: String },
    Duplicate { category: String, url: String },
    Failed { category: String, url: String, title: String, reason: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub run_id: Uuid,
    pub notifier_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub inserted: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub skipped_entries: usize,
    pub malformed_entries: usize,
    pub skipped_feeds: usize,
    pub failed_feeds: usize,
    pub events: Vec<IngestEvent>,
}

impl BatchReport {
    pub fn new(notifier_name: &str) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            notifier_name: notifier_name.to_string(),
            started_at: Utc::now(),
            finished_at: None,
            inserted: 0,
            duplicates: 0,
            failed: 0,
            skipped_entries: 0,
            malformed_entries: 0,
            skipped_feeds: 0,
            failed_feeds: 0,
            events: Vec::new(),
        }
    }

    pub fn record(&mut self, event: IngestEvent) {
        match &event {
            IngestEvent::FeedFailed { .. } | IngestEvent::MalformedFeedTimestamp { .. } => self.failed_feeds += 1,
            IngestEvent::SkippedFeed { .. } => self.skipped_feeds += 1,
            IngestEvent::SkippedEntry { .. } => self.skipped_entries += 1,
            IngestEvent::MalformedTimestamp { .. } => self.malformed_entries += 1,
            IngestEvent::Inserted { .. } => self.inserted += 1,
            IngestEvent::Duplicate { .. } => self.duplicates += 1,
            IngestEvent::Failed { .. } => self.failed += 1,
        }
        self.events.push(event);
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// Entries that reached the store.
    pub fn total_attempted(&self) -> usize {
        self.inserted + self.duplicates + self.failed
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.failed_feeds > 0
    }

    pub fn summary(&self) -> String {
        format!(
            "{} inserted, {} duplicate, {} failed, {} stale entries, {} malformed entries, {} stale feeds, {} failed feeds",
            self.inserted,
            self.duplicates,
            self.failed,
            self.skipped_entries,
            self.malformed_entries,
            self.skipped_feeds,
            self.failed_feeds
        )
    }
}
