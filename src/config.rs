use crate::freshness::{FreshnessPolicy, DEFAULT_WINDOW_DAYS};
use crate::types::FetchConfig;
use clap::Parser;
use url::Url;

/// Process configuration, read once at start. Every setting comes from the
/// environment; the flags exist for local runs.
#[derive(Debug, Clone, Parser)]
#[command(name = "rss-crawler", version, about = "Records fresh feed entries for one notifier")]
pub struct CrawlerConfig {
    /// PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Table holding the feed history
    #[arg(long, env = "FEED_TABLE_NAME", default_value = "rss_history")]
    pub table_name: String,

    /// Maximum age in days of feeds and entries that are still processed
    #[arg(long, env = "FRESHNESS_WINDOW_DAYS", default_value_t = DEFAULT_WINDOW_DAYS,
          value_parser = clap::value_parser!(i64).range(0..))]
    pub window_days: i64,

    #[arg(long, env = "FETCH_TIMEOUT_SECONDS", default_value_t = 30)]
    pub fetch_timeout_seconds: u64,

    #[arg(long, env = "FETCH_USER_AGENT")]
    pub user_agent: Option<String>,

    #[arg(long, env = "MAX_FEED_SIZE_MB", default_value_t = 10)]
    pub max_feed_size_mb: usize,

    /// Create the table when it does not exist yet
    #[arg(long, env = "ENSURE_SCHEMA", default_value_t = false, action = clap::ArgAction::Set)]
    pub ensure_schema: bool,
}

impl CrawlerConfig {
    pub fn freshness_policy(&self) -> FreshnessPolicy {
        FreshnessPolicy::new(self.window_days)
    }

    pub fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            user_agent: self.user_agent.clone().unwrap_or(defaults.user_agent),
            timeout_seconds: self.fetch_timeout_seconds,
            max_feed_size_mb: self.max_feed_size_mb,
            max_redirects: defaults.max_redirects,
        }
    }

    /// The database URL with any password replaced, for logging.
    pub fn redacted_database_url(&self) -> String {
        redact_database_url(&self.database_url)
    }
}

const REDACTED_PLACEHOLDER: &str = "<unparseable database url>";

fn redact_database_url(raw: &str) -> String {
    let Ok(mut url) = Url::parse(raw) else {
        return REDACTED_PLACEHOLDER.to_string();
    };
    if url.password().is_some() && url.set_password(Some("***")).is_err() {
        return REDACTED_PLACEHOLDER.to_string();
    }
    url.to_string()
}
