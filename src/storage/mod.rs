//! Entry storage
//!
//! The query engine only talks to storage through [`EntryRepository`]. Two
//! implementations ship with the crate: an in-memory store used by tests and
//! embedders, and a SQLite store backed by sqlx.

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::entry::{Entry, EntryType};
use crate::error::AppError;

pub use memory::MemoryRepository;
pub use sqlite::SqliteRepository;

/// Fetch options for [`EntryRepository::get`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryQueryOptions {
    /// Maximum number of entries returned
    pub limit: usize,
    /// Only entries carrying this tag
    pub tag: Option<String>,
    pub family_hash: Option<String>,
    /// Only entries with a sequence strictly below this one
    pub before_sequence: Option<i64>,
}

impl EntryQueryOptions {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit,
            ..Default::default()
        }
    }

    /// Whether `entry` passes the tag, family hash and sequence filters
    pub fn accepts(&self, entry: &Entry) -> bool {
        if let Some(tag) = &self.tag {
            if !entry.tags.iter().any(|t| t == tag) {
                return false;
            }
        }
        if let Some(hash) = &self.family_hash {
            if entry.family_hash.as_deref() != Some(hash.as_str()) {
                return false;
            }
        }
        if let Some(before) = self.before_sequence {
            if entry.sequence >= before {
                return false;
            }
        }
        true
    }
}

/// Bulk delete predicate; unset fields match everything
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeleteFilter {
    pub entry_type: Option<EntryType>,
    /// Delete entries created strictly before this instant
    pub created_before: Option<DateTime<Utc>>,
}

impl DeleteFilter {
    pub fn matches(&self, entry: &Entry) -> bool {
        self.entry_type.map_or(true, |t| entry.entry_type == t)
            && self.created_before.map_or(true, |cutoff| entry.created_at < cutoff)
    }
}

/// Storage-wide counters
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StorageStats {
    pub total_entries: u64,
    pub by_type: BTreeMap<String, u64>,
    pub oldest_entry: Option<String>,
    pub newest_entry: Option<String>,
}

#[async_trait]
pub trait EntryRepository: Send + Sync {
    /// Entries of one type, newest first
    async fn get(
        &self,
        entry_type: EntryType,
        options: &EntryQueryOptions,
    ) -> Result<Vec<Entry>, AppError>;

    async fn find(&self, id: &str) -> Result<Option<Entry>, AppError>;

    /// Store an entry and return it with its assigned sequence
    async fn insert(&self, entry: &Entry) -> Result<Entry, AppError>;

    async fn insert_batch(&self, entries: &[Entry]) -> Result<u64, AppError> {
        let mut inserted = 0;
        for entry in entries {
            self.insert(entry).await?;
            inserted += 1;
        }
        Ok(inserted)
    }

    /// Delete one entry; `false` when the id was unknown
    async fn delete(&self, id: &str) -> Result<bool, AppError>;

    async fn delete_where(&self, filter: &DeleteFilter) -> Result<u64, AppError>;

    async fn stats(&self) -> Result<StorageStats, AppError>;
}
