use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{Connection, QueryBuilder, Sqlite, SqliteConnection};
use tracing::debug;

use crate::error::RelayError;
use crate::feed::FeedEntry;

/// Durable record of already-delivered entries, backed by a single SQLite
/// file. A connection is opened per operation rather than held across
/// polls, so concurrent workers rely only on SQLite's native write
/// serialization plus the unique `link` constraint.
#[derive(Debug, Clone)]
pub struct ItemStore {
    path: PathBuf,
}

impl ItemStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    async fn connect(&self) -> Result<SqliteConnection, RelayError> {
        let options = SqliteConnectOptions::new()
            .filename(&self.path)
            .create_if_missing(true)
            .busy_timeout(std::time::Duration::from_secs(5));
        Ok(SqliteConnection::connect_with(&options).await?)
    }

    /// Creates the items table if absent. Idempotent; called once at
    /// startup before any worker is spawned.
    pub async fn init(&self) -> Result<(), RelayError> {
        let mut conn = self.connect().await?;
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rss_key TEXT,
                title TEXT,
                link TEXT UNIQUE,
                description TEXT,
                pub_date TEXT,
                insert_time TEXT
            )",
        )
        .execute(&mut conn)
        .await?;
        Ok(())
    }

    /// Returns the subset of `entries` whose link has never been recorded,
    /// under any feed. One batched existence query, not N round trips.
    pub async fn filter_unseen(
        &self,
        entries: Vec<FeedEntry>,
    ) -> Result<Vec<FeedEntry>, RelayError> {
        if entries.is_empty() {
            return Ok(entries);
        }
        let mut conn = self.connect().await?;
        let mut query = QueryBuilder::<Sqlite>::new("SELECT link FROM items WHERE link IN (");
        let mut links = query.separated(", ");
        for entry in &entries {
            links.push_bind(&entry.link);
        }
        links.push_unseparated(")");
        let existing: HashSet<String> = query
            .build_query_scalar::<String>()
            .fetch_all(&mut conn)
            .await?
            .into_iter()
            .collect();
        Ok(entries
            .into_iter()
            .filter(|entry| !existing.contains(&entry.link))
            .collect())
    }

    /// Persists one delivered entry under `rss_key`. A pre-existing link
    /// (concurrent insert, or prior delivery under another feed) silently
    /// no-ops: duplicate delivery attempts are tolerated, duplicate storage
    /// is not.
    pub async fn record(&self, rss_key: &str, entry: &FeedEntry) -> Result<(), RelayError> {
        let mut conn = self.connect().await?;
        let result = sqlx::query(
            "INSERT OR IGNORE INTO items
                (rss_key, title, link, description, pub_date, insert_time)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(rss_key)
        .bind(&entry.title)
        .bind(&entry.link)
        .bind(&entry.description)
        .bind(&entry.pub_date)
        .bind(Utc::now().to_rfc3339())
        .execute(&mut conn)
        .await?;
        if result.rows_affected() == 0 {
            debug!(link = %entry.link, "link already recorded, ignoring");
        }
        Ok(())
    }
}
