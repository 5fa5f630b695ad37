use regex::Regex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::LazyLock;

use super::{count_by, numeric_or_zero, numeric_sample, percentage, EntryTool, ToolContext};
use crate::entry::{Entry, EntryType};
use crate::error::AppError;
use crate::query::args::{Action, QueryArgs};
use crate::stats::NumericSummary;

static NUMBER_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));
static SINGLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"'[^']*'").expect("valid regex"));
static DOUBLE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""[^"]*""#).expect("valid regex"));

/// Replace numeric and quoted literals with `?` so structurally equal
/// statements share one key
///
/// Digits are replaced first, so a quoted literal containing digits still
/// collapses to a single placeholder.
pub fn normalize_sql(sql: &str) -> String {
    let normalized = NUMBER_LITERAL.replace_all(sql, "?");
    let normalized = SINGLE_QUOTED.replace_all(&normalized, "?");
    DOUBLE_QUOTED.replace_all(&normalized, "?").into_owned()
}

/// Database queries executed by the application
#[derive(Debug, Clone, Copy, Default)]
pub struct QueriesTool;

struct DuplicateGroup {
    sql: String,
    normalized: String,
    count: usize,
    total_time: f64,
}

impl QueriesTool {
    fn slow_queries(&self, entries: &[Entry], args: &QueryArgs, ctx: &ToolContext<'_>) -> Value {
        let threshold = args.min_time.unwrap_or(ctx.config.thresholds.slow_query_ms);

        let mut slow: Vec<&Entry> = entries
            .iter()
            .filter(|e| numeric_or_zero(e, "time") >= threshold)
            .collect();
        slow.sort_by(|a, b| numeric_or_zero(b, "time").total_cmp(&numeric_or_zero(a, "time")));
        slow.truncate(ctx.limit);

        let rows: Vec<Value> = slow
            .iter()
            .map(|e| {
                json!({
                    "id": e.id,
                    "sql": e.content_str("sql").unwrap_or_default(),
                    "time": e.field("time").cloned().unwrap_or(json!(0)),
                    "connection": e.content_str("connection").unwrap_or_default(),
                    "created_at": e.created_at_string(),
                })
            })
            .collect();

        json!({
            "slow_queries": rows,
            "threshold_ms": threshold,
            "total_slow": rows.len(),
        })
    }

    fn duplicate_queries(&self, entries: &[Entry], ctx: &ToolContext<'_>) -> Value {
        let mut groups: Vec<DuplicateGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for entry in entries {
            let Some(sql) = entry.content_str("sql").filter(|s| !s.is_empty()) else {
                continue;
            };
            let normalized = normalize_sql(&sql);
            let time = numeric_or_zero(entry, "time");

            match index.get(&normalized) {
                Some(&slot) => {
                    groups[slot].count += 1;
                    groups[slot].total_time += time;
                }
                None => {
                    index.insert(normalized.clone(), groups.len());
                    groups.push(DuplicateGroup {
                        sql,
                        normalized,
                        count: 1,
                        total_time: time,
                    });
                }
            }
        }

        groups.retain(|g| g.count > 1);
        // Stable: equal counts keep first-seen order
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        groups.truncate(ctx.limit);

        let rows: Vec<Value> = groups
            .iter()
            .map(|g| {
                json!({
                    "sql": g.sql,
                    "normalized": g.normalized,
                    "count": g.count,
                    "total_time": g.total_time,
                    "avg_time": g.total_time / g.count as f64,
                })
            })
            .collect();

        json!({
            "duplicate_queries": rows,
            "total_duplicates": rows.len(),
            "note": "Duplicate queries may indicate N+1 query problems",
        })
    }
}

impl EntryTool for QueriesTool {
    fn name(&self) -> &'static str {
        "queries"
    }

    fn entry_type(&self) -> EntryType {
        EntryType::Query
    }

    fn list_fields(&self) -> &'static [&'static str] {
        &["id", "content.sql", "content.time", "content.connection", "created_at"]
    }

    fn searchable_fields(&self) -> &'static [&'static str] {
        &["sql", "connection"]
    }

    fn summary_field(&self) -> &'static str {
        "time"
    }

    fn narrow(&self, mut entries: Vec<Entry>, args: &QueryArgs, _ctx: &ToolContext<'_>) -> Vec<Entry> {
        if let Some(connection) = args.connection.as_deref() {
            entries.retain(|e| e.content_str("connection").as_deref() == Some(connection));
        }
        entries
    }

    fn statistics(&self, entries: &[Entry], _args: &QueryArgs, ctx: &ToolContext<'_>) -> Value {
        if entries.is_empty() {
            return json!({});
        }

        let times = numeric_sample(entries, "time");
        let time = NumericSummary::from_values(&times);

        let threshold = ctx.config.thresholds.slow_query_ms;
        let slow_count = times.iter().filter(|t| **t >= threshold).count();

        json!({
            "total_queries": entries.len(),
            "time": {
                "avg": time.avg,
                "min": time.min,
                "max": time.max,
                "total": time.total,
                "p50": time.p50,
                "p95": time.p95,
                "p99": time.p99,
            },
            "connections": count_by(entries, "connection", "unknown").to_value(),
            "slow_queries": {
                "count": slow_count,
                "threshold_ms": threshold,
                "percentage": percentage(slow_count, entries.len()),
            },
        })
    }

    fn specialty(
        &self,
        action: Action,
        entries: &[Entry],
        args: &QueryArgs,
        ctx: &ToolContext<'_>,
    ) -> Option<Result<Value, AppError>> {
        match action {
            Action::Slow => Some(Ok(self.slow_queries(entries, args, ctx))),
            Action::Duplicates => Some(Ok(self.duplicate_queries(entries, ctx))),
            _ => None,
        }
    }
}
