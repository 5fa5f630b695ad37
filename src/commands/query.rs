//! Query command
//!
//! Runs one entry tool against the configured store and prints the envelope.

use anyhow::Result;
use clap::Parser;
use entry_lens::{Config, QueryArgs};
use std::sync::Arc;

#[derive(Debug, Clone, Parser)]
pub struct QueryCommandArgs {
    /// Tool name (requests, queries, jobs, logs, exceptions, cache, ...)
    pub tool: String,

    /// list, summary, detail, stats, search, slow, duplicates, failed, prune
    #[arg(short, long)]
    pub action: Option<String>,

    /// Time window (5m, 15m, 1h, 6h, 24h, 7d, 14d, 21d, 30d, 3M, 6M, 12M)
    #[arg(short, long)]
    pub period: Option<String>,

    #[arg(short, long)]
    pub limit: Option<i64>,

    #[arg(long)]
    pub offset: Option<i64>,

    /// Opaque cursor from a previous page
    #[arg(long)]
    pub cursor: Option<String>,

    /// Entry id for the detail action
    #[arg(long)]
    pub id: Option<String>,

    /// Search text
    #[arg(short, long)]
    pub query: Option<String>,

    /// Route group filter for requests
    #[arg(long)]
    pub route_type: Option<String>,

    #[arg(long)]
    pub status: Option<i64>,

    #[arg(long)]
    pub method: Option<String>,

    /// Slow request threshold in milliseconds
    #[arg(long)]
    pub min_duration: Option<f64>,

    /// Slow query threshold in milliseconds
    #[arg(long)]
    pub min_time: Option<f64>,

    /// Retention period for the prune action
    #[arg(long)]
    pub older_than: Option<String>,

    /// Log level filter
    #[arg(long)]
    pub level: Option<String>,

    /// Database connection filter for queries
    #[arg(long)]
    pub connection: Option<String>,

    #[arg(long)]
    pub tag: Option<String>,

    /// Print the raw envelope as JSON
    #[arg(long)]
    pub json: bool,
}

impl QueryCommandArgs {
    pub fn to_query_args(&self) -> QueryArgs {
        QueryArgs {
            action: self.action.clone(),
            period: self.period.clone(),
            limit: self.limit,
            offset: self.offset,
            cursor: self.cursor.clone(),
            id: self.id.clone(),
            query: self.query.clone(),
            route_type: self.route_type.clone(),
            status: self.status,
            method: self.method.clone(),
            min_duration: self.min_duration,
            min_time: self.min_time,
            older_than: self.older_than.clone(),
            level: self.level.clone(),
            connection: self.connection.clone(),
            tag: self.tag.clone(),
            ..Default::default()
        }
    }
}

/// Execute the query command
pub async fn execute(cfg: Arc<Config>, args: QueryCommandArgs) -> Result<()> {
    let engine = super::open_engine(cfg).await?;
    let query = args.to_query_args();
    let action = query.action.clone().unwrap_or_else(|| "list".to_string());

    let envelope = engine.execute(&args.tool, query).await;
    super::print_envelope(&format!("{} {}", args.tool, action), &envelope, args.json)
}
