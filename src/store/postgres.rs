use super::{EntryStore, PutOutcome};
use crate::types::{CrawlerError, FeedRecord, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

const UNIQUE_VIOLATION: &str = "23505";
const MAX_IDENTIFIER_LEN: usize = 63;

/// Feed history table in PostgreSQL, one row per url.
pub struct PgEntryStore {
    pool: PgPool,
    table: String,
    insert_sql: String,
}

impl PgEntryStore {
    pub async fn connect(database_url: &str, table_name: &str) -> Result<Self> {
        let table = validate_table_name(table_name)?;
        let pool = PgPool::connect(database_url).await?;

        info!("Connected entry store to table {}", table);
        Ok(Self::build(pool, table))
    }

    fn build(pool: PgPool, table: String) -> Self {
        let insert_sql = format!(
            r#"
            INSERT INTO {table} (url, notifier_name, title, category, pubtime)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (url) DO NOTHING
            "#
        );
        Self { pool, table, insert_sql }
    }

    pub async fn ensure_schema(&self) -> Result<()> {
        let ddl = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {} (
                url TEXT PRIMARY KEY,
                notifier_name TEXT NOT NULL,
                title TEXT NOT NULL,
                category TEXT NOT NULL,
                pubtime TEXT NOT NULL,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
            self.table
        );
        sqlx::query(&ddl).execute(&self.pool).await?;

        info!("Ensured schema for table {}", self.table);
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
        debug!("Closed entry store pool");
    }
}

#[async_trait]
impl EntryStore for PgEntryStore {
    async fn put(&self, record: &FeedRecord) -> PutOutcome {
        let result = sqlx::query(&self.insert_sql)
            .bind(record.url())
            .bind(record.notifier_name())
            .bind(record.title())
            .bind(record.category())
            .bind(record.pub_time())
            .execute(&self.pool)
            .await;

        match result {
            Ok(done) => outcome_for_rows(done.rows_affected()),
            Err(e) => classify_error(e),
        }
    }
}

fn outcome_for_rows(rows_affected: u64) -> PutOutcome {
    if rows_affected > 0 {
        PutOutcome::Inserted
    } else {
        PutOutcome::Duplicate
    }
}

fn classify_error(error: sqlx::Error) -> PutOutcome {
    if let sqlx::Error::Database(db_error) = &error {
        if db_error.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return PutOutcome::Duplicate;
        }
    }
    PutOutcome::Failed(error.to_string())
}

/// Table names are spliced into SQL, so only plain identifiers are accepted,
/// optionally schema-qualified.
pub fn validate_table_name(name: &str) -> Result<String> {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() > 2 {
        return Err(CrawlerError::Config(format!("table name {:?} has too many qualifiers", name)));
    }

    for part in &parts {
        let valid = !part.is_empty()
            && part.len() <= MAX_IDENTIFIER_LEN
            && !part.starts_with(|c: char| c.is_ascii_digit())
            && part.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid {
            return Err(CrawlerError::Config(format!("invalid table name {:?}", name)));
        }
    }

    Ok(name.to_string())
}
