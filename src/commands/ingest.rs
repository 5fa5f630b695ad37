//! Ingest command
//!
//! Loads newline-delimited JSON entries into the configured SQLite store.
//! Each line is `{"type": "request", "content": {...}}` with optional `id`,
//! `created_at` (RFC 3339), `family_hash` and `tags`.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use colored::Colorize;
use entry_lens::storage::EntryRepository;
use entry_lens::{Config, Entry, EntryType, SqliteRepository};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Deserialize)]
struct IngestRecord {
    id: Option<String>,
    #[serde(rename = "type")]
    entry_type: EntryType,
    #[serde(default)]
    content: Value,
    created_at: Option<DateTime<Utc>>,
    family_hash: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

impl IngestRecord {
    fn into_entry(self, now: DateTime<Utc>) -> Entry {
        let id = self.id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let mut entry = Entry::new(id, self.entry_type, self.content, self.created_at.unwrap_or(now));
        entry.family_hash = self.family_hash;
        entry.tags = self.tags;
        entry
    }
}

/// Parse JSON Lines; blank lines are skipped
fn parse_entries(input: &str, now: DateTime<Utc>) -> Result<Vec<Entry>> {
    input
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            let record: IngestRecord = serde_json::from_str(line)
                .with_context(|| format!("Invalid entry on line {}", index + 1))?;
            Ok(record.into_entry(now))
        })
        .collect()
}

/// Execute the ingest command
pub async fn execute(cfg: Arc<Config>, file: &Path) -> Result<()> {
    let input = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let entries = parse_entries(&input, Utc::now())?;

    let repository = SqliteRepository::connect(&cfg.storage.database_path).await?;
    let inserted = repository.insert_batch(&entries).await?;

    info!(inserted = inserted, file = %file.display(), "Ingested entries");
    println!(
        "{}",
        format!("✓ Ingested {} entries into {}", inserted, cfg.storage.database_path).green()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_entries() {
        let now = DateTime::from_timestamp(1_700_000_000, 0).unwrap();
        let input = r#"{"id": "a", "type": "request", "content": {"uri": "/"}, "created_at": "2023-11-14T22:00:00Z", "tags": ["auth"]}

{"type": "log", "content": {"level": "error"}}
"#;
        let entries = parse_entries(input, now).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, "a");
        assert_eq!(entries[0].tags, vec!["auth".to_string()]);
        assert_eq!(entries[1].entry_type, EntryType::Log);
        assert_eq!(entries[1].created_at, now);
        assert!(!entries[1].id.is_empty());
    }

    #[test]
    fn test_parse_entries_reports_line() {
        let err = parse_entries("{\"type\": \"request\"}\n{\"type\": \"mail\"}", Utc::now())
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid entry on line 2");
    }
}
