//! Tools whose statistics are plain frequency breakdowns

use serde_json::{json, Value};

use super::{count_by, EntryTool, ToolContext};
use crate::entry::{Entry, EntryType};
use crate::query::args::QueryArgs;
use crate::query::period::Period;

const TOP_N: usize = 10;

/// Declarative tool profile
#[derive(Debug, Clone, Copy)]
pub struct CatalogTool {
    name: &'static str,
    entry_type: EntryType,
    list_fields: &'static [&'static str],
    searchable_fields: &'static [&'static str],
    default_period: Period,
    stats: fn(&[Entry]) -> Value,
}

impl EntryTool for CatalogTool {
    fn name(&self) -> &'static str {
        self.name
    }

    fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    fn list_fields(&self) -> &'static [&'static str] {
        self.list_fields
    }

    fn searchable_fields(&self) -> &'static [&'static str] {
        self.searchable_fields
    }

    fn default_period(&self) -> Period {
        self.default_period
    }

    fn statistics(&self, entries: &[Entry], _args: &QueryArgs, _ctx: &ToolContext<'_>) -> Value {
        if entries.is_empty() {
            return json!({});
        }
        (self.stats)(entries)
    }
}

/// Every catalog tool
pub fn all() -> Vec<CatalogTool> {
    vec![
        CatalogTool {
            name: "exceptions",
            entry_type: EntryType::Exception,
            list_fields: &[
                "id",
                "content.class",
                "content.message",
                "content.file",
                "content.line",
                "created_at",
            ],
            searchable_fields: &["class", "message", "file"],
            default_period: Period::OneHour,
            stats: exception_stats,
        },
        CatalogTool {
            name: "cache",
            entry_type: EntryType::Cache,
            list_fields: &["id", "content.type", "content.key", "created_at"],
            searchable_fields: &["key", "type"],
            default_period: Period::OneHour,
            stats: cache_stats,
        },
        CatalogTool {
            name: "events",
            entry_type: EntryType::Event,
            list_fields: &["id", "content.name", "content.broadcast", "created_at"],
            searchable_fields: &["name"],
            default_period: Period::OneHour,
            stats: event_stats,
        },
        CatalogTool {
            name: "gates",
            entry_type: EntryType::Gate,
            list_fields: &["id", "content.ability", "content.result", "created_at"],
            searchable_fields: &["ability"],
            default_period: Period::OneHour,
            stats: gate_stats,
        },
        CatalogTool {
            name: "models",
            entry_type: EntryType::Model,
            list_fields: &["id", "content.model", "content.action", "created_at"],
            searchable_fields: &["model", "action"],
            default_period: Period::OneHour,
            stats: model_stats,
        },
        CatalogTool {
            name: "notifications",
            entry_type: EntryType::Notification,
            list_fields: &["id", "content.notification", "content.channel", "created_at"],
            searchable_fields: &["notification", "channel"],
            default_period: Period::OneHour,
            stats: notification_stats,
        },
        CatalogTool {
            name: "redis",
            entry_type: EntryType::Redis,
            list_fields: &["id", "content.command", "content.connection", "created_at"],
            searchable_fields: &["command", "connection"],
            default_period: Period::OneHour,
            stats: redis_stats,
        },
        CatalogTool {
            name: "schedule",
            entry_type: EntryType::Schedule,
            list_fields: &["id", "content.command", "content.description", "created_at"],
            searchable_fields: &["command", "description"],
            // Scheduled tasks are sparse, look back a full day
            default_period: Period::OneDay,
            stats: schedule_stats,
        },
        CatalogTool {
            name: "views",
            entry_type: EntryType::View,
            list_fields: &["id", "content.name", "content.path", "created_at"],
            searchable_fields: &["name", "path"],
            default_period: Period::OneHour,
            stats: view_stats,
        },
        CatalogTool {
            name: "commands",
            entry_type: EntryType::Command,
            list_fields: &["id", "content.command", "content.exit_code", "created_at"],
            searchable_fields: &["command"],
            default_period: Period::OneHour,
            stats: command_stats,
        },
    ]
}

fn exception_stats(entries: &[Entry]) -> Value {
    let classes = count_by(entries, "class", "Unknown");
    let files = count_by(entries, "file", "Unknown");

    json!({
        "total_exceptions": entries.len(),
        "by_class": classes.top_value(TOP_N),
        "by_file": files.top_value(TOP_N),
        "unique_classes": classes.len(),
        "unique_files": files.len(),
        "most_common_exception": classes.most_common(),
        "most_common_file": files.most_common(),
    })
}

fn cache_stats(entries: &[Entry]) -> Value {
    json!({
        "total_operations": entries.len(),
        "by_type": count_by(entries, "type", "unknown").to_value(),
    })
}

fn event_stats(entries: &[Entry]) -> Value {
    let events = count_by(entries, "name", "unknown");
    let broadcast = entries.iter().filter(|e| e.content_bool("broadcast")).count();

    json!({
        "total_events": entries.len(),
        "by_event": events.top_value(TOP_N),
        "broadcast_count": broadcast,
        "unique_events": events.len(),
    })
}

fn gate_stats(entries: &[Entry]) -> Value {
    let result_is = |wanted: &str| {
        entries
            .iter()
            .filter(|e| e.content_str("result").as_deref() == Some(wanted))
            .count()
    };

    json!({
        "total_checks": entries.len(),
        "by_ability": count_by(entries, "ability", "unknown").top_value(TOP_N),
        "allowed": result_is("allowed"),
        "denied": result_is("denied"),
    })
}

fn model_stats(entries: &[Entry]) -> Value {
    json!({
        "total_events": entries.len(),
        "by_model": count_by(entries, "model", "unknown").top_value(TOP_N),
        "by_action": count_by(entries, "action", "unknown").to_value(),
    })
}

fn notification_stats(entries: &[Entry]) -> Value {
    json!({
        "total_notifications": entries.len(),
        "by_notification": count_by(entries, "notification", "unknown").top_value(TOP_N),
        "by_channel": count_by(entries, "channel", "unknown").to_value(),
    })
}

fn redis_stats(entries: &[Entry]) -> Value {
    json!({
        "total_commands": entries.len(),
        "by_command": count_by(entries, "command", "unknown").top_value(TOP_N),
        "by_connection": count_by(entries, "connection", "default").to_value(),
    })
}

fn schedule_stats(entries: &[Entry]) -> Value {
    let commands = count_by(entries, "command", "unknown");

    json!({
        "total_executions": entries.len(),
        "by_command": commands.top_value(TOP_N),
        "unique_tasks": commands.len(),
    })
}

fn view_stats(entries: &[Entry]) -> Value {
    let views = count_by(entries, "name", "unknown");

    json!({
        "total_renders": entries.len(),
        "by_view": views.top_value(TOP_N),
        "unique_views": views.len(),
    })
}

fn command_stats(entries: &[Entry]) -> Value {
    let failed = entries
        .iter()
        .filter(|e| e.content_i64("exit_code").unwrap_or(0) != 0)
        .count();

    json!({
        "total_commands": entries.len(),
        "by_command": count_by(entries, "command", "unknown").top_value(TOP_N),
        "by_exit_code": count_by(entries, "exit_code", "0").to_value(),
        "failed_count": failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(entry_type: EntryType, content: Value) -> Entry {
        Entry::new("x", entry_type, content, Utc::now())
    }

    fn tool(name: &str) -> CatalogTool {
        all().into_iter().find(|t| t.name == name).unwrap()
    }

    #[test]
    fn test_exception_stats() {
        let entries = vec![
            entry(EntryType::Exception, json!({"class": "TypeError", "file": "a.php"})),
            entry(EntryType::Exception, json!({"class": "ValueError", "file": "b.php"})),
            entry(EntryType::Exception, json!({"class": "ValueError"})),
        ];
        let stats = exception_stats(&entries);
        assert_eq!(stats["total_exceptions"], 3);
        assert_eq!(stats["most_common_exception"], "ValueError");
        assert_eq!(stats["unique_files"], 3);
        assert_eq!(stats["by_file"]["Unknown"], 1);
        // Ties keep first-seen order
        assert_eq!(stats["most_common_file"], "a.php");
    }

    #[test]
    fn test_command_stats_counts_failures() {
        let entries = vec![
            entry(EntryType::Command, json!({"command": "migrate", "exit_code": 0})),
            entry(EntryType::Command, json!({"command": "migrate", "exit_code": 1})),
            entry(EntryType::Command, json!({"command": "cache:clear"})),
            entry(EntryType::Command, json!({"command": "queue:work", "exit_code": 137})),
        ];
        let stats = command_stats(&entries);
        assert_eq!(stats["failed_count"], 2);
        assert_eq!(stats["by_exit_code"], json!({"0": 2, "1": 1, "137": 1}));
        assert_eq!(stats["by_command"]["migrate"], 2);
    }

    #[test]
    fn test_event_and_gate_stats() {
        let events = vec![
            entry(EntryType::Event, json!({"name": "OrderShipped", "broadcast": true})),
            entry(EntryType::Event, json!({"name": "OrderShipped", "broadcast": false})),
            entry(EntryType::Event, json!({"name": "UserLoggedIn"})),
        ];
        let stats = event_stats(&events);
        assert_eq!(stats["broadcast_count"], 1);
        assert_eq!(stats["unique_events"], 2);

        let gates = vec![
            entry(EntryType::Gate, json!({"ability": "update", "result": "allowed"})),
            entry(EntryType::Gate, json!({"ability": "delete", "result": "denied"})),
            entry(EntryType::Gate, json!({"ability": "delete"})),
        ];
        let stats = gate_stats(&gates);
        assert_eq!(stats["allowed"], 1);
        assert_eq!(stats["denied"], 1);
        assert_eq!(stats["by_ability"], json!({"delete": 2, "update": 1}));
    }

    #[test]
    fn test_top_ten_truncation() {
        let entries: Vec<Entry> = (0..15)
            .map(|i| entry(EntryType::View, json!({"name": format!("view.{}", i)})))
            .collect();
        let stats = view_stats(&entries);
        assert_eq!(stats["by_view"].as_object().unwrap().len(), 10);
        assert_eq!(stats["unique_views"], 15);
    }

    #[test]
    fn test_profiles() {
        let schedule = tool("schedule");
        assert_eq!(schedule.default_period(), Period::OneDay);
        assert_eq!(schedule.entry_type(), EntryType::Schedule);
        assert_eq!(tool("cache").searchable_fields(), &["key", "type"]);
        assert_eq!(all().len(), 10);
    }
}
