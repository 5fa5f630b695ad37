use serde_json::{json, Map, Value};
use std::collections::HashMap;

use super::{count_by, numeric_or_zero, numeric_sample, percentage, EntryTool, ToolContext};
use crate::entry::{Entry, EntryType};
use crate::error::AppError;
use crate::query::args::{Action, QueryArgs};
use crate::stats::{FrequencyTable, NumericSummary};

const TOP_ENDPOINTS: usize = 5;

/// HTTP requests handled by the application
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestsTool;

impl RequestsTool {
    fn slow_requests(&self, entries: &[Entry], args: &QueryArgs, ctx: &ToolContext<'_>) -> Value {
        let route_type = args.route_filter().unwrap_or("all");
        let threshold = args
            .min_duration
            .unwrap_or_else(|| ctx.route_filter.thresholds(route_type).slow_request_ms);

        let mut slow: Vec<&Entry> = entries
            .iter()
            .filter(|e| numeric_or_zero(e, "duration") >= threshold)
            .collect();
        slow.sort_by(|a, b| {
            numeric_or_zero(b, "duration").total_cmp(&numeric_or_zero(a, "duration"))
        });
        slow.truncate(ctx.limit);

        let rows: Vec<Value> = slow
            .iter()
            .map(|e| {
                json!({
                    "id": e.id,
                    "method": e.content_str("method").unwrap_or_default(),
                    "uri": e.content_str("uri").unwrap_or_default(),
                    "status": e.field("response_status").cloned().unwrap_or(json!(0)),
                    "duration": e.field("duration").cloned().unwrap_or(json!(0)),
                    "controller": e.content_str("controller_action").unwrap_or_default(),
                    "memory": e.field("memory").cloned().unwrap_or(json!(0)),
                    "created_at": e.created_at_string(),
                })
            })
            .collect();

        json!({
            "slow_requests": rows,
            "threshold_ms": threshold,
            "total_slow": rows.len(),
        })
    }
}

/// Top endpoints by request count, each with its average duration
fn top_endpoints(entries: &[Entry], n: usize) -> Value {
    let mut counts = FrequencyTable::new();
    let mut durations: HashMap<String, f64> = HashMap::new();

    for entry in entries {
        let endpoint = entry
            .content_str("controller_action")
            .or_else(|| entry.content_str("uri"))
            .unwrap_or_else(|| "unknown".to_string());

        *durations.entry(endpoint.clone()).or_insert(0.0) += numeric_or_zero(entry, "duration");
        counts.record(endpoint);
    }

    let map: Map<String, Value> = counts
        .top(n)
        .into_iter()
        .map(|(endpoint, count)| {
            let total = durations.get(&endpoint).copied().unwrap_or(0.0);
            let stats = json!({
                "count": count,
                "avg_duration": total / count as f64,
            });
            (endpoint, stats)
        })
        .collect();
    Value::Object(map)
}

impl EntryTool for RequestsTool {
    fn name(&self) -> &'static str {
        "requests"
    }

    fn entry_type(&self) -> EntryType {
        EntryType::Request
    }

    fn list_fields(&self) -> &'static [&'static str] {
        &[
            "id",
            "content.method",
            "content.uri",
            "content.controller_action",
            "content.response_status",
            "content.duration",
            "content.memory",
            "created_at",
        ]
    }

    fn searchable_fields(&self) -> &'static [&'static str] {
        &["uri", "controller_action", "method", "ip_address"]
    }

    fn narrow(&self, entries: Vec<Entry>, args: &QueryArgs, ctx: &ToolContext<'_>) -> Vec<Entry> {
        let mut entries = match args.route_filter() {
            Some(route_type) => ctx.route_filter.filter_requests(entries, Some(route_type)),
            None => entries,
        };

        if let Some(status) = args.status {
            entries.retain(|e| e.content_i64("response_status") == Some(status));
        }
        if let Some(method) = args.method.as_deref() {
            entries.retain(|e| {
                e.content_str("method")
                    .is_some_and(|m| m.eq_ignore_ascii_case(method))
            });
        }

        entries
    }

    fn statistics(&self, entries: &[Entry], args: &QueryArgs, ctx: &ToolContext<'_>) -> Value {
        let route_type = args.route_type.as_deref().unwrap_or("all");

        if entries.is_empty() {
            return json!({
                "total_requests": 0,
                "route_type": route_type,
                "message": "No requests found for the specified period",
            });
        }

        let mut durations = numeric_sample(entries, "duration");
        if durations.is_empty() {
            durations.push(0.0);
        }
        let mut memories = numeric_sample(entries, "memory");
        if memories.is_empty() {
            memories.push(0.0);
        }
        let duration = NumericSummary::from_values(&durations);
        let memory = NumericSummary::from_values(&memories);

        let mut statuses = FrequencyTable::new();
        let (mut success, mut errors) = (0usize, 0usize);
        for entry in entries {
            let status = entry.content_i64("response_status").unwrap_or(0);
            if (200..400).contains(&status) {
                success += 1;
            } else if status >= 400 {
                errors += 1;
            }
            statuses.record(status.to_string());
        }

        json!({
            "total_requests": entries.len(),
            "route_type": route_type,
            "duration": {
                "avg": duration.avg,
                "min": duration.min,
                "max": duration.max,
                "p50": duration.p50,
                "p95": duration.p95,
                "p99": duration.p99,
            },
            "memory": {
                "avg": memory.avg,
                "min": memory.min,
                "max": memory.max,
            },
            "status": {
                "success": success,
                "error": errors,
                "error_rate": percentage(errors, entries.len()),
                "breakdown": statuses.to_value(),
            },
            "methods": count_by(entries, "method", "UNKNOWN").to_value(),
            "endpoints": top_endpoints(entries, TOP_ENDPOINTS),
            "route_breakdown": ctx.route_filter.route_breakdown_value(entries),
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
            Action::Slow => Some(Ok(self.slow_requests(entries, args, ctx))),
            _ => None,
        }
    }
}
