use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{DeleteFilter, EntryQueryOptions, EntryRepository, StorageStats};
use crate::entry::{Entry, EntryType};
use crate::error::AppError;

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<Entry>,
    next_sequence: i64,
}

/// Process-local entry store
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-filled with `entries` in insertion order
    pub fn with_entries(entries: impl IntoIterator<Item = Entry>) -> Self {
        let mut state = MemoryState::default();
        for entry in entries {
            push(&mut state, entry);
        }
        Self {
            state: RwLock::new(state),
        }
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn push(state: &mut MemoryState, mut entry: Entry) -> Entry {
    state.next_sequence += 1;
    entry.sequence = state.next_sequence;
    state.entries.push(entry.clone());
    entry
}

#[async_trait]
impl EntryRepository for MemoryRepository {
    async fn get(
        &self,
        entry_type: EntryType,
        options: &EntryQueryOptions,
    ) -> Result<Vec<Entry>, AppError> {
        let state = self.state.read().await;
        let entries = state
            .entries
            .iter()
            .rev()
            .filter(|e| e.entry_type == entry_type && options.accepts(e))
            .take(options.limit)
            .cloned()
            .collect();
        Ok(entries)
    }

    async fn find(&self, id: &str) -> Result<Option<Entry>, AppError> {
        let state = self.state.read().await;
        Ok(state.entries.iter().find(|e| e.id == id).cloned())
    }

    async fn insert(&self, entry: &Entry) -> Result<Entry, AppError> {
        let mut state = self.state.write().await;
        if state.entries.iter().any(|e| e.id == entry.id) {
            return Err(AppError::InvalidArgument(format!(
                "Duplicate entry id: {}",
                entry.id
            )));
        }
        Ok(push(&mut state, entry.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|e| e.id != id);
        Ok(state.entries.len() < before)
    }

    async fn delete_where(&self, filter: &DeleteFilter) -> Result<u64, AppError> {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|e| !filter.matches(e));
        Ok((before - state.entries.len()) as u64)
    }

    async fn stats(&self) -> Result<StorageStats, AppError> {
        let state = self.state.read().await;
        let mut stats = StorageStats {
            total_entries: state.entries.len() as u64,
            ..Default::default()
        };

        for entry in &state.entries {
            *stats
                .by_type
                .entry(entry.entry_type.as_str().to_string())
                .or_insert(0) += 1;
        }

        stats.oldest_entry = state
            .entries
            .iter()
            .min_by_key(|e| e.created_at)
            .map(|e| e.created_at_string());
        stats.newest_entry = state
            .entries
            .iter()
            .max_by_key(|e| e.created_at)
            .map(|e| e.created_at_string());

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use serde_json::json;

    fn entry(id: &str, entry_type: EntryType, age_days: i64) -> Entry {
        Entry::new(
            id,
            entry_type,
            json!({}),
            Utc::now() - Duration::days(age_days),
        )
    }

    #[tokio::test]
    async fn test_get_is_newest_first_and_limited() {
        let repo = MemoryRepository::with_entries(vec![
            entry("a", EntryType::Query, 0),
            entry("b", EntryType::Request, 0),
            entry("c", EntryType::Query, 0),
            entry("d", EntryType::Query, 0),
        ]);

        let queries = repo
            .get(EntryType::Query, &EntryQueryOptions::with_limit(2))
            .await
            .unwrap();
        let ids: Vec<&str> = queries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["d", "c"]);

        let before = EntryQueryOptions {
            before_sequence: Some(3),
            ..EntryQueryOptions::with_limit(10)
        };
        let older = repo.get(EntryType::Query, &before).await.unwrap();
        assert_eq!(older.len(), 1);
        assert_eq!(older[0].id, "a");
    }

    #[tokio::test]
    async fn test_insert_assigns_sequence() {
        let repo = MemoryRepository::new();
        let first = repo.insert(&entry("a", EntryType::Log, 0)).await.unwrap();
        let second = repo.insert(&entry("b", EntryType::Log, 0)).await.unwrap();
        assert_eq!(first.sequence, 1);
        assert_eq!(second.sequence, 2);

        assert!(repo.insert(&entry("a", EntryType::Log, 0)).await.is_err());
    }

    #[tokio::test]
    async fn test_delete_and_stats() {
        let repo = MemoryRepository::with_entries(vec![
            entry("a", EntryType::Log, 40),
            entry("b", EntryType::Log, 1),
            entry("c", EntryType::Job, 40),
        ]);

        assert!(repo.delete("b").await.unwrap());
        assert!(!repo.delete("b").await.unwrap());

        let deleted = repo
            .delete_where(&DeleteFilter {
                entry_type: Some(EntryType::Log),
                created_before: Some(Utc::now() - Duration::days(30)),
            })
            .await
            .unwrap();
        assert_eq!(deleted, 1);

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_entries, 1);
        assert_eq!(stats.by_type.get("job"), Some(&1));
        assert!(stats.oldest_entry.is_some());
    }
}
