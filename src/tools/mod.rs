//! Per-entry-type tool profiles
//!
//! A tool tells the query engine which entries it reads, how they are listed
//! and searched, and how they are summarized. Specialty analyses (slow
//! requests, duplicate queries, failed jobs) are extra actions on a tool.

pub mod catalog;
pub mod jobs;
pub mod logs;
pub mod queries;
pub mod requests;

use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Config;
use crate::entry::{numeric_value, scalar_string, Entry, EntryType};
use crate::error::AppError;
use crate::query::args::{Action, QueryArgs};
use crate::query::period::Period;
use crate::query::route_filter::RouteFilter;
use crate::stats::{FrequencyTable, NumericSummary};

pub use jobs::JobsTool;
pub use logs::LogsTool;
pub use queries::QueriesTool;
pub use requests::RequestsTool;

/// Read-only collaborators a tool may consult while evaluating a query
#[derive(Clone, Copy)]
pub struct ToolContext<'a> {
    pub config: &'a Config,
    pub route_filter: &'a RouteFilter,
    /// Page size already clamped by the pagination manager
    pub limit: usize,
}

pub trait EntryTool: Send + Sync {
    /// Name callers use to address the tool
    fn name(&self) -> &'static str;

    fn entry_type(&self) -> EntryType;

    /// Dotted paths projected in `list` and `search`
    fn list_fields(&self) -> &'static [&'static str];

    /// Content keys concatenated for `search`
    fn searchable_fields(&self) -> &'static [&'static str];

    /// Numeric content field summarized by `summary`
    fn summary_field(&self) -> &'static str {
        "duration"
    }

    fn default_period(&self) -> Period {
        Period::OneHour
    }

    /// Tool-specific filtering applied after the time window
    fn narrow(&self, entries: Vec<Entry>, _args: &QueryArgs, _ctx: &ToolContext<'_>) -> Vec<Entry> {
        entries
    }

    /// Payload of the `stats` action
    fn statistics(&self, entries: &[Entry], args: &QueryArgs, ctx: &ToolContext<'_>) -> Value;

    /// Payload of a specialty action, or `None` when the tool has no such action
    fn specialty(
        &self,
        _action: Action,
        _entries: &[Entry],
        _args: &QueryArgs,
        _ctx: &ToolContext<'_>,
    ) -> Option<Result<Value, AppError>> {
        None
    }

    /// Whether the `prune` action deletes this tool's entries
    fn supports_prune(&self) -> bool {
        false
    }
}

/// Tools addressable by name
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<&'static str, Arc<dyn EntryTool>>,
    order: Vec<&'static str>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in tool
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(RequestsTool));
        registry.register(Arc::new(QueriesTool));
        registry.register(Arc::new(JobsTool));
        registry.register(Arc::new(LogsTool));
        for tool in catalog::all() {
            registry.register(Arc::new(tool));
        }
        registry
    }

    /// Add a tool; a tool with the same name is replaced
    pub fn register(&mut self, tool: Arc<dyn EntryTool>) {
        let name = tool.name();
        if self.tools.insert(name, tool).is_none() {
            self.order.push(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn EntryTool>> {
        self.tools.get(name).cloned()
    }

    /// Tool names in registration order
    pub fn names(&self) -> &[&'static str] {
        &self.order
    }
}

/// Numeric sample of `field`: missing counts as zero, non-numeric values are skipped
pub fn numeric_sample(entries: &[Entry], field: &str) -> Vec<f64> {
    entries
        .iter()
        .filter_map(|entry| match entry.field(field) {
            None => Some(0.0),
            Some(value) => numeric_value(value),
        })
        .collect()
}

/// Numeric field with missing or malformed values read as zero
pub fn numeric_or_zero(entry: &Entry, field: &str) -> f64 {
    entry.content_f64(field).unwrap_or(0.0)
}

/// Frequency of a categorical field, missing values counted under `fallback`
pub fn count_by(entries: &[Entry], field: &str, fallback: &str) -> FrequencyTable {
    FrequencyTable::from_keys(entries.iter().map(|entry| {
        entry
            .field(field)
            .and_then(scalar_string)
            .unwrap_or_else(|| fallback.to_string())
    }))
}

/// `{count, avg_<f>, min_<f>, max_<f>, p50, p95, p99}` over one numeric field
pub fn summary_stats(entries: &[Entry], field: &str) -> Value {
    let mut stats = serde_json::Map::new();
    if entries.is_empty() {
        stats.insert("count".to_string(), json!(0));
        stats.insert(format!("avg_{}", field), json!(0));
        stats.insert(format!("min_{}", field), json!(0));
        stats.insert(format!("max_{}", field), json!(0));
        return Value::Object(stats);
    }

    let summary = NumericSummary::from_values(&numeric_sample(entries, field));

    stats.insert("count".to_string(), json!(entries.len()));
    stats.insert(format!("avg_{}", field), json!(summary.avg));
    stats.insert(format!("min_{}", field), json!(summary.min));
    stats.insert(format!("max_{}", field), json!(summary.max));
    stats.insert("p50".to_string(), json!(summary.p50));
    stats.insert("p95".to_string(), json!(summary.p95));
    stats.insert("p99".to_string(), json!(summary.p99));
    Value::Object(stats)
}

/// Share of `part` in `whole` as a `"x%"` string rounded to two places
pub fn percentage(part: usize, whole: usize) -> String {
    if whole == 0 {
        return "0%".to_string();
    }
    let value = crate::stats::round_to(part as f64 / whole as f64 * 100.0, 2);
    format!("{}%", value)
}
