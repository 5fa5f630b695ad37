//! Command implementations for the CLI
//!
//! - query: Run an entry query tool
//! - maintenance: Storage statistics and cleanup
//! - ingest: Load entries from JSON Lines
//! - config: Configuration display and validation

pub mod config;
pub mod ingest;
pub mod maintenance;
pub mod query;

use anyhow::Result;
use colored::Colorize;
use entry_lens::{Config, EntryQueryEngine, Envelope, SqliteRepository};
use std::sync::Arc;

/// Open the configured SQLite store and build an engine over it
pub async fn open_engine(cfg: Arc<Config>) -> Result<EntryQueryEngine> {
    let repository = SqliteRepository::connect(&cfg.storage.database_path).await?;
    Ok(EntryQueryEngine::new(Arc::new(repository), cfg)?)
}

/// Print an envelope; error envelopes become a failed command
pub fn print_envelope(title: &str, envelope: &Envelope, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(&envelope.to_json())?);
    } else if !envelope.is_error {
        println!("{}", title.green().bold());
        println!();
        println!("{}", envelope.text());
    }

    if envelope.is_error {
        anyhow::bail!("{}", envelope.text().trim_start_matches("Error: "));
    }
    Ok(())
}
