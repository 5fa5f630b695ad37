//! SQLite entry store
//!
//! Entries live in a single `entries` table keyed by an autoincrement
//! `sequence`. Content and tags are stored as JSON text, timestamps as unix
//! milliseconds.

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use std::time::Duration;

use super::{DeleteFilter, EntryQueryOptions, EntryRepository, StorageStats};
use crate::entry::{Entry, EntryType, TIMESTAMP_FORMAT};
use crate::error::AppError;

const ENTRY_COLUMNS: &str = "sequence, uuid, family_hash, type, content, tags, created_at";

pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    /// Open (or create) the database at `database_path` and run migrations
    ///
    /// Accepts a plain file path, a `sqlite:` URL, or `sqlite::memory:`.
    pub async fn connect(database_path: &str) -> anyhow::Result<Self> {
        let url = if database_path.starts_with("sqlite:") {
            database_path.to_string()
        } else {
            format!("sqlite:{}", database_path)
        };
        let in_memory = url.contains(":memory:");

        if !in_memory {
            let file = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            if let Some(parent) = std::path::Path::new(file).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory {}", parent.display())
                    })?;
                }
            }
        }

        let options = SqliteConnectOptions::from_str(&url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(30))
            .pragma("synchronous", "NORMAL");

        // Every in-memory connection is its own database
        let max_connections = if in_memory { 1 } else { 5 };

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if in_memory {
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to entry database at {}", database_path))?;

        Self::run_migrations(&pool).await?;

        Ok(Self { pool })
    }

    async fn run_migrations(pool: &SqlitePool) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(pool)
            .await
            .context("Failed to run entry database migrations")?;

        tracing::info!("Entry database migrations completed");
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn row_to_entry(row: &SqliteRow) -> Result<Entry, AppError> {
    let type_tag: String = row.try_get("type")?;
    let entry_type = EntryType::from_str(&type_tag)
        .map_err(|_| AppError::InternalError(format!("Unknown stored entry type: {}", type_tag)))?;

    // Malformed JSON degrades to empty content rather than failing the fetch
    let content: String = row.try_get("content")?;
    let content = match serde_json::from_str::<Value>(&content) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    };

    let tags: String = row.try_get("tags")?;
    let tags = serde_json::from_str::<Vec<String>>(&tags).unwrap_or_default();

    let created_at: i64 = row.try_get("created_at")?;

    Ok(Entry {
        id: row.try_get("uuid")?,
        entry_type,
        sequence: row.try_get("sequence")?,
        family_hash: row.try_get("family_hash")?,
        tags,
        content,
        created_at: DateTime::from_timestamp_millis(created_at).unwrap_or_default(),
    })
}

/// Decode a row, logging and dropping it when it no longer maps to an entry
fn decode_row(row: &SqliteRow) -> Option<Entry> {
    match row_to_entry(row) {
        Ok(entry) => Some(entry),
        Err(e) => {
            let uuid: Option<String> = row.try_get("uuid").ok();
            tracing::warn!(uuid = ?uuid, error = %e, "Skipping undecodable stored entry");
            None
        }
    }
}

fn millis_to_string(millis: Option<i64>) -> Option<String> {
    millis
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|t| t.format(TIMESTAMP_FORMAT).to_string())
}

fn push_delete_conditions(builder: &mut QueryBuilder<'_, Sqlite>, filter: &DeleteFilter) {
    builder.push(" WHERE 1 = 1");
    if let Some(entry_type) = filter.entry_type {
        builder.push(" AND type = ").push_bind(entry_type.as_str());
    }
    if let Some(cutoff) = filter.created_before {
        builder
            .push(" AND created_at < ")
            .push_bind(cutoff.timestamp_millis());
    }
}

#[async_trait]
impl EntryRepository for SqliteRepository {
    async fn get(
        &self,
        entry_type: EntryType,
        options: &EntryQueryOptions,
    ) -> Result<Vec<Entry>, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {} FROM entries WHERE type = ",
            ENTRY_COLUMNS
        ));
        builder.push_bind(entry_type.as_str());

        if let Some(tag) = &options.tag {
            builder
                .push(" AND EXISTS (SELECT 1 FROM json_each(entries.tags) WHERE json_each.value = ")
                .push_bind(tag.clone())
                .push(")");
        }
        if let Some(hash) = &options.family_hash {
            builder.push(" AND family_hash = ").push_bind(hash.clone());
        }
        if let Some(before) = options.before_sequence {
            builder.push(" AND sequence < ").push_bind(before);
        }

        builder
            .push(" ORDER BY sequence DESC LIMIT ")
            .push_bind(options.limit as i64);

        let rows = builder.build().fetch_all(&self.pool).await?;
        Ok(rows.iter().filter_map(decode_row).collect())
    }

    async fn find(&self, id: &str) -> Result<Option<Entry>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM entries WHERE uuid = ?",
            ENTRY_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().and_then(decode_row))
    }

    async fn insert(&self, entry: &Entry) -> Result<Entry, AppError> {
        let result = sqlx::query(
            "INSERT INTO entries (uuid, family_hash, type, content, tags, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&entry.id)
        .bind(&entry.family_hash)
        .bind(entry.entry_type.as_str())
        .bind(serde_json::to_string(&entry.content)?)
        .bind(serde_json::to_string(&entry.tags)?)
        .bind(entry.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        let mut stored = entry.clone();
        stored.sequence = result.last_insert_rowid();
        Ok(stored)
    }

    async fn insert_batch(&self, entries: &[Entry]) -> Result<u64, AppError> {
        if entries.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO entries (uuid, family_hash, type, content, tags, created_at)
                 VALUES (?, ?, ?, ?, ?, ?)",
            )
            .bind(&entry.id)
            .bind(&entry.family_hash)
            .bind(entry.entry_type.as_str())
            .bind(serde_json::to_string(&entry.content)?)
            .bind(serde_json::to_string(&entry.tags)?)
            .bind(entry.created_at.timestamp_millis())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(entries.len() as u64)
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM entries WHERE uuid = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_where(&self, filter: &DeleteFilter) -> Result<u64, AppError> {
        let mut builder = QueryBuilder::<Sqlite>::new("DELETE FROM entries");
        push_delete_conditions(&mut builder, filter);

        let result = builder.build().execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn stats(&self) -> Result<StorageStats, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM entries")
            .fetch_one(&self.pool)
            .await?;

        let by_type: Vec<(String, i64)> =
            sqlx::query_as("SELECT type, COUNT(*) FROM entries GROUP BY type")
                .fetch_all(&self.pool)
                .await?;

        let (oldest, newest): (Option<i64>, Option<i64>) =
            sqlx::query_as("SELECT MIN(created_at), MAX(created_at) FROM entries")
                .fetch_one(&self.pool)
                .await?;

        Ok(StorageStats {
            total_entries: total as u64,
            by_type: by_type
                .into_iter()
                .map(|(t, count)| (t, count as u64))
                .collect(),
            oldest_entry: millis_to_string(oldest),
            newest_entry: millis_to_string(newest),
        })
    }
}
