mod common;

use common::{entry, feeds, init_tracing, now, ScriptedFeedSource};
use rss_crawler::{Crawler, EntryStore, FreshnessPolicy, IngestEvent, InMemoryEntryStore};
use std::sync::Arc;
use tracing::info;

fn crawler(store: &Arc<InMemoryEntryStore>) -> Crawler {
    let store: Arc<dyn EntryStore> = store.clone();
    Crawler::new(store, FreshnessPolicy::default())
}

#[tokio::test]
async fn test_fresh_entries_are_recorded_once() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    let source = Arc::new(ScriptedFeedSource::new(
        "https://example.com/feed",
        "Mon, 26 Sep 2022 10:00:00 +0000",
        vec![
            entry("https://example.com/a", "A", "Tue, 20 Sep 2022 16:05:47 +0000"),
            entry("https://example.com/b", "B", "2022-09-26T09:00:00Z"),
        ],
    ));
    let feeds = feeds(vec![("What's new", source)]);

    let first = crawler(&store).run_at(now(), "AwsWhatsNew", &feeds).await;
    info!("First run: {}", first.summary());
    assert_eq!(first.inserted, 2);
    assert_eq!(first.duplicates, 0);

    let second = crawler(&store).run_at(now(), "AwsWhatsNew", &feeds).await;
    assert_eq!(second.inserted, 0);
    assert_eq!(second.duplicates, 2);
    assert_ne!(first.run_id, second.run_id);

    assert_eq!(store.len().await, 2);
    let record = store.get("https://example.com/a").await.unwrap();
    assert_eq!(record.title(), "A");
    assert_eq!(record.category(), "What's new");
    assert_eq!(record.notifier_name(), "AwsWhatsNew");
    assert_eq!(record.pub_time(), "2022-09-20T16:05:47");
}

#[tokio::test]
async fn test_freshness_boundary_per_entry() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    let source = Arc::new(ScriptedFeedSource::new(
        "https://example.com/feed",
        "2022-09-26T00:00:00",
        vec![
            entry("https://example.com/edge", "Edge", "2022-09-20T00:00:00"),
            entry("https://example.com/old", "Old", "2022-09-19T00:00:00"),
            entry("https://example.com/future", "Future", "2022-10-30T00:00:00"),
        ],
    ));

    let report = crawler(&store).run_at(now(), "team-a", &feeds(vec![("blog", source)])).await;

    assert_eq!(report.inserted, 2);
    assert_eq!(report.skipped_entries, 1);
    assert!(store.get("https://example.com/edge").await.is_some());
    assert!(store.get("https://example.com/future").await.is_some());
    assert!(store.get("https://example.com/old").await.is_none());
    assert!(report.events.contains(&IngestEvent::SkippedEntry {
        category: "blog".to_string(),
        url: "https://example.com/old".to_string(),
        title: "Old".to_string(),
    }));
}

#[tokio::test]
async fn test_stale_feed_skips_all_entries() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    let stale = Arc::new(ScriptedFeedSource::new(
        "https://example.com/stale",
        "Mon, 12 Sep 2022 10:00:00 +0000",
        vec![entry("https://example.com/would-be-fresh", "Fresh", "2022-09-26T00:00:00")],
    ));
    let active = Arc::new(ScriptedFeedSource::new(
        "https://example.com/active",
        "2022-09-26T00:00:00",
        vec![entry("https://example.com/active-1", "Active", "2022-09-25T00:00:00")],
    ));

    let report = crawler(&store)
        .run_at(now(), "team-a", &feeds(vec![("stale", stale.clone()), ("active", active)]))
        .await;

    assert_eq!(report.skipped_feeds, 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(stale.entry_reads(), 0);
    assert!(store.get("https://example.com/would-be-fresh").await.is_none());
    assert!(report.events.contains(&IngestEvent::SkippedFeed {
        category: "stale".to_string(),
        updated_at: "2022-09-12T10:00:00".to_string(),
    }));
}

#[tokio::test]
async fn test_store_failure_does_not_abort_batch() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    store.fail_on("https://example.com/2", "AccessDeniedException").await;

    let source = Arc::new(ScriptedFeedSource::new(
        "https://example.com/feed",
        "2022-09-26T00:00:00",
        vec![
            entry("https://example.com/1", "One", "2022-09-25T00:00:00"),
            entry("https://example.com/2", "Two", "2022-09-25T01:00:00"),
            entry("https://example.com/3", "Three", "2022-09-25T02:00:00"),
        ],
    ));

    let report = crawler(&store).run_at(now(), "team-a", &feeds(vec![("blog", source)])).await;

    assert_eq!(report.inserted, 2);
    assert_eq!(report.failed, 1);
    assert_eq!(report.total_attempted(), 3);
    assert!(report.has_failures());
    assert!(report.finished_at.is_some());

    let kinds: Vec<&str> = report
        .events
        .iter()
        .map(|event| match event {
            IngestEvent::Inserted { .. } => "inserted",
            IngestEvent::Failed { .. } => "failed",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["inserted", "failed", "inserted"]);

    assert!(report.events.contains(&IngestEvent::Failed {
        category: "blog".to_string(),
        url: "https://example.com/2".to_string(),
        title: "Two".to_string(),
        reason: "AccessDeniedException".to_string(),
    }));
}

#[tokio::test]
async fn test_malformed_timestamp_is_isolated() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    let source = Arc::new(ScriptedFeedSource::new(
        "https://example.com/feed",
        "2022-09-26T00:00:00",
        vec![
            entry("https://example.com/before", "Before", "2022-09-25T00:00:00"),
            entry("https://example.com/broken", "Broken", "sometime last week"),
            entry("https://example.com/undated", "Undated", ""),
            entry("https://example.com/after", "After", "2022-09-25T00:00:00"),
        ],
    ));

    let report = crawler(&store).run_at(now(), "team-a", &feeds(vec![("blog", source)])).await;

    assert_eq!(report.inserted, 2);
    assert_eq!(report.malformed_entries, 2);
    assert!(!report.has_failures());
    assert!(store.get("https://example.com/broken").await.is_none());
    assert!(store.get("https://example.com/after").await.is_some());
}

#[tokio::test]
async fn test_feed_failures_are_contained_per_category() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    let down = Arc::new(ScriptedFeedSource::unreachable("https://down.example.com/feed", "HTTP 503"));
    let garbled = Arc::new(ScriptedFeedSource::new("https://garbled.example.com/feed", "not a date", Vec::new()));
    let truncated = Arc::new(ScriptedFeedSource::with_broken_entries(
        "https://truncated.example.com/feed",
        "2022-09-26T00:00:00",
        "unexpected end of document",
    ));
    let healthy = Arc::new(ScriptedFeedSource::new(
        "https://example.com/feed",
        "2022-09-26T00:00:00",
        vec![entry("https://example.com/ok", "Ok", "2022-09-26T00:00:00")],
    ));

    let report = crawler(&store)
        .run_at(
            now(),
            "team-a",
            &feeds(vec![
                ("down", down),
                ("garbled", garbled),
                ("truncated", truncated),
                ("healthy", healthy),
            ]),
        )
        .await;

    assert_eq!(report.failed_feeds, 3);
    assert_eq!(report.inserted, 1);
    assert!(report.events.contains(&IngestEvent::MalformedFeedTimestamp {
        category: "garbled".to_string(),
        raw: "not a date".to_string(),
    }));
    assert!(report
        .events
        .iter()
        .any(|event| matches!(event, IngestEvent::FeedFailed { category, reason } if category == "down" && reason.contains("HTTP 503"))));
}

#[tokio::test]
async fn test_same_url_across_categories_is_stored_once() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    let shared = entry("https://example.com/shared", "Shared", "2022-09-25T00:00:00");
    let first = Arc::new(ScriptedFeedSource::new("https://a.example.com/feed", "2022-09-26T00:00:00", vec![shared.clone()]));
    let second = Arc::new(ScriptedFeedSource::new("https://b.example.com/feed", "2022-09-26T00:00:00", vec![shared]));

    let report = crawler(&store)
        .run_at(now(), "team-a", &feeds(vec![("a-first", first), ("b-second", second)]))
        .await;

    assert_eq!(report.inserted, 1);
    assert_eq!(report.duplicates, 1);
    // categories run in name order, so the first category wins
    assert_eq!(store.get("https://example.com/shared").await.unwrap().category(), "a-first");
}

#[tokio::test]
async fn test_window_is_taken_from_policy() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    let source = Arc::new(ScriptedFeedSource::new(
        "https://example.com/feed",
        "2022-09-26T00:00:00",
        vec![
            entry("https://example.com/recent", "Recent", "2022-09-26T12:00:00"),
            entry("https://example.com/three-days", "Three days", "2022-09-24T00:00:00"),
        ],
    ));

    let store_handle: Arc<dyn EntryStore> = store.clone();
    let crawler = Crawler::new(store_handle, FreshnessPolicy::new(1));
    let report = crawler.run_at(now(), "team-a", &feeds(vec![("blog", source)])).await;

    assert_eq!(crawler.policy().window_days(), 1);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.skipped_entries, 1);
}

#[tokio::test]
async fn test_empty_feed_set_yields_empty_report() {
    init_tracing();

    let store = Arc::new(InMemoryEntryStore::new());
    let report = crawler(&store).run("team-a", &feeds(Vec::new())).await;

    assert_eq!(report.notifier_name, "team-a");
    assert!(report.events.is_empty());
    assert_eq!(report.total_attempted(), 0);
    assert!(store.is_empty().await);
}
