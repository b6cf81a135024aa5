use anyhow::Context;
use clap::Parser;
use rss_crawler::source::sources_for;
use rss_crawler::{Crawler, CrawlerConfig, NotifierConfig, PgEntryStore};
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the report, logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = CrawlerConfig::parse();
    info!("Starting RSS crawler");

    let mut raw_event = String::new();
    tokio::io::stdin()
        .read_to_string(&mut raw_event)
        .await
        .context("failed to read invocation event from stdin")?;
    let notifier = NotifierConfig::from_json(&raw_event).context("invalid invocation event")?;

    info!("Connecting to database: {}", config.redacted_database_url());
    let store = PgEntryStore::connect(&config.database_url, &config.table_name)
        .await
        .map_err(|e| {
            error!("Failed to connect to database {}", config.redacted_database_url());
            e
        })
        .context("failed to open entry store")?;

    if config.ensure_schema {
        store.ensure_schema().await.context("failed to create feed table")?;
    }
    let store = Arc::new(store);

    let sources = sources_for(&notifier, &config.fetch_config()).context("failed to build feed sources")?;
    let crawler = Crawler::new(store.clone(), config.freshness_policy());
    let report = crawler.run(&notifier.notifier_name, &sources).await;

    println!("{}", serde_json::to_string(&report)?);

    store.close().await;
    info!("RSS crawler finished");
    Ok(())
}
