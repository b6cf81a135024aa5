use super::{EntryStore, PutOutcome};
use crate::types::FeedRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// In-process store used by tests and local runs.
#[derive(Default)]
pub struct InMemoryEntryStore {
    records: RwLock<HashMap<String, FeedRecord>>,
    faults: RwLock<HashMap<String, String>>,
}

impl InMemoryEntryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every future `put` for `url` fail with `reason`.
    pub async fn fail_on(&self, url: impl Into<String>, reason: impl Into<String>) {
        self.faults.write().await.insert(url.into(), reason.into());
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, url: &str) -> Option<FeedRecord> {
        self.records.read().await.get(url).cloned()
    }

    pub async fn records(&self) -> Vec<FeedRecord> {
        let mut records: Vec<FeedRecord> = self.records.read().await.values().cloned().collect();
        records.sort_by(|a, b| a.url().cmp(b.url()));
        records
    }
}

#[async_trait]
impl EntryStore for InMemoryEntryStore {
    async fn put(&self, record: &FeedRecord) -> PutOutcome {
        if let Some(reason) = self.faults.read().await.get(record.url()) {
            return PutOutcome::Failed(reason.clone());
        }

        // check and insert under one guard
        let mut records = self.records.write().await;
        if records.contains_key(record.url()) {
            debug!("Record already present: {}", record.url());
            return PutOutcome::Duplicate;
        }
        records.insert(record.url().to_string(), record.clone());
        PutOutcome::Inserted
    }
}
