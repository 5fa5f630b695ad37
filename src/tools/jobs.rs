use serde_json::{json, Value};

use super::{count_by, EntryTool, ToolContext};
use crate::entry::{Entry, EntryType};
use crate::error::AppError;
use crate::query::args::{Action, QueryArgs};

/// Queued jobs processed by workers
#[derive(Debug, Clone, Copy, Default)]
pub struct JobsTool;

impl JobsTool {
    fn failed_jobs(&self, entries: &[Entry], ctx: &ToolContext<'_>) -> Value {
        let failed: Vec<Value> = entries
            .iter()
            .filter(|e| e.content_str("status").as_deref() == Some("failed"))
            .take(ctx.limit)
            .map(Entry::normalized)
            .collect();

        json!({
            "failed_jobs": failed,
            "total_failed": failed.len(),
        })
    }
}

impl EntryTool for JobsTool {
    fn name(&self) -> &'static str {
        "jobs"
    }

    fn entry_type(&self) -> EntryType {
        EntryType::Job
    }

    fn list_fields(&self) -> &'static [&'static str] {
        &["id", "content.name", "content.status", "content.queue", "created_at"]
    }

    fn searchable_fields(&self) -> &'static [&'static str] {
        &["name", "queue"]
    }

    fn statistics(&self, entries: &[Entry], _args: &QueryArgs, _ctx: &ToolContext<'_>) -> Value {
        if entries.is_empty() {
            return json!({});
        }

        json!({
            "total_jobs": entries.len(),
            "by_status": count_by(entries, "status", "unknown").to_value(),
            "by_queue": count_by(entries, "queue", "default").to_value(),
            "by_job": count_by(entries, "name", "unknown").top_value(10),
        })
    }

    fn specialty(
        &self,
        action: Action,
        entries: &[Entry],
        _args: &QueryArgs,
        ctx: &ToolContext<'_>,
    ) -> Option<Result<Value, AppError>> {
        match action {
            Action::Failed => Some(Ok(self.failed_jobs(entries, ctx))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::query::route_filter::RouteFilter;
    use chrono::Utc;

    fn job(id: &str, name: &str, status: &str, queue: Option<&str>) -> Entry {
        let mut content = json!({"name": name, "status": status});
        if let Some(queue) = queue {
            content["queue"] = json!(queue);
        }
        Entry::new(id, EntryType::Job, content, Utc::now())
    }

    fn sample() -> Vec<Entry> {
        vec![
            job("1", "SendMail", "processed", Some("mail")),
            job("2", "SendMail", "failed", Some("mail")),
            job("3", "Reindex", "failed", None),
            job("4", "Reindex", "pending", None),
            job("5", "Reindex", "processed", None),
        ]
    }

    #[test]
    fn test_failed_jobs_respects_limit() {
        let config = Config::default();
        let route_filter = RouteFilter::new(&config.overview, 1000.0).unwrap();
        let ctx = ToolContext {
            config: &config,
            route_filter: &route_filter,
            limit: 1,
        };

        let payload = JobsTool
            .specialty(Action::Failed, &sample(), &QueryArgs::default(), &ctx)
            .unwrap()
            .unwrap();
        assert_eq!(payload["total_failed"], 1);
        assert_eq!(payload["failed_jobs"][0]["id"], "2");
        assert_eq!(payload["failed_jobs"][0]["content"]["status"], "failed");

        assert!(JobsTool
            .specialty(Action::Slow, &sample(), &QueryArgs::default(), &ctx)
            .is_none());
    }

    #[test]
    fn test_statistics() {
        let config = Config::default();
        let route_filter = RouteFilter::new(&config.overview, 1000.0).unwrap();
        let ctx = ToolContext {
            config: &config,
            route_filter: &route_filter,
            limit: 10,
        };

        let stats = JobsTool.statistics(&sample(), &QueryArgs::default(), &ctx);
        assert_eq!(stats["total_jobs"], 5);
        assert_eq!(stats["by_status"], json!({"processed": 2, "failed": 2, "pending": 1}));
        assert_eq!(stats["by_queue"], json!({"mail": 2, "default": 3}));
        assert_eq!(stats["by_job"], json!({"Reindex": 3, "SendMail": 2}));
    }
}
