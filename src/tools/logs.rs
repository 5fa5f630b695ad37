use serde_json::{json, Value};

use super::{count_by, EntryTool, ToolContext};
use crate::entry::{Entry, EntryType};
use crate::query::args::QueryArgs;

/// Application log records
#[derive(Debug, Clone, Copy, Default)]
pub struct LogsTool;

impl EntryTool for LogsTool {
    fn name(&self) -> &'static str {
        "logs"
    }

    fn entry_type(&self) -> EntryType {
        EntryType::Log
    }

    fn list_fields(&self) -> &'static [&'static str] {
        &["id", "content.level", "content.message", "content.context", "created_at"]
    }

    fn searchable_fields(&self) -> &'static [&'static str] {
        &["level", "message"]
    }

    fn narrow(&self, mut entries: Vec<Entry>, args: &QueryArgs, _ctx: &ToolContext<'_>) -> Vec<Entry> {
        if let Some(level) = args.level.as_deref() {
            entries.retain(|e| {
                e.content_str("level")
                    .is_some_and(|l| l.eq_ignore_ascii_case(level))
            });
        }
        entries
    }

    fn statistics(&self, entries: &[Entry], _args: &QueryArgs, _ctx: &ToolContext<'_>) -> Value {
        if entries.is_empty() {
            return json!({});
        }

        let levels = count_by(entries, "level", "unknown");

        json!({
            "total_logs": entries.len(),
            "levels": levels.to_value(),
            "critical_count": levels.get("critical") + levels.get("emergency") + levels.get("alert"),
            "error_count": levels.get("error"),
            "warning_count": levels.get("warning"),
            "info_count": levels.get("info"),
            "debug_count": levels.get("debug"),
        })
    }

    fn supports_prune(&self) -> bool {
        true
    }
}
