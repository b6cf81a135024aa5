use crate::timestamp::NormalizedTimestamp;
use chrono::NaiveDateTime;

pub const DEFAULT_WINDOW_DAYS: i64 = 7;

/// Decides whether a feed or an entry is recent enough to process.
///
/// Age is counted in whole days (truncated), so anything up to the end of
/// day `window_days` is still fresh. Timestamps in the future count as fresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreshnessPolicy {
    window_days: i64,
}

impl Default for FreshnessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_WINDOW_DAYS)
    }
}

impl FreshnessPolicy {
    pub fn new(window_days: i64) -> Self {
        Self { window_days }
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    pub fn is_fresh(&self, timestamp: &NormalizedTimestamp, now: NaiveDateTime) -> bool {
        is_fresh(timestamp.as_naive(), now, self.window_days)
    }
}

pub fn is_fresh(timestamp: NaiveDateTime, now: NaiveDateTime, window_days: i64) -> bool {
    now.signed_duration_since(timestamp).num_days() <= window_days
}
