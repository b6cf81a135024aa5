pub mod memory;
pub mod postgres;

pub use memory::InMemoryEntryStore;
pub use postgres::PgEntryStore;

use crate::types::FeedRecord;
use async_trait::async_trait;

/// Result of a single conditional insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
    /// A new record now exists.
    Inserted,
    /// A record with the same url was already stored; nothing changed.
    Duplicate,
    /// The store rejected the write for any other reason; nothing changed.
    Failed(String),
}

/// Durable keyed storage for feed records.
///
/// `put` is an insert-if-absent keyed by `url`. Implementations fold every
/// failure into [`PutOutcome::Failed`]; callers never see an `Err`.
#[async_trait]
pub trait EntryStore: Send + Sync {
    async fn put(&self, record: &FeedRecord) -> PutOutcome;
}
