//! Storage maintenance: statistics, pruning and clearing
//!
//! `prune` and `clear` are destructive and refuse to run without
//! `confirm=true`.

use chrono::{DateTime, Duration, Utc};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::entry::{EntryType, TIMESTAMP_FORMAT};
use crate::error::AppError;
use crate::query::args::QueryArgs;
use crate::storage::{DeleteFilter, EntryRepository};

/// Retention window used when `older_than` is absent or unrecognized
pub const DEFAULT_RETENTION: &str = "30d";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceAction {
    Stats,
    Prune,
    Clear,
}

impl MaintenanceAction {
    /// Absent action means `stats`; anything unrecognized is rejected
    pub fn parse(action: Option<&str>) -> Result<Self, AppError> {
        match action.unwrap_or("stats") {
            "stats" => Ok(MaintenanceAction::Stats),
            "prune" => Ok(MaintenanceAction::Prune),
            "clear" => Ok(MaintenanceAction::Clear),
            other => Err(AppError::InvalidArgument(format!("Unknown action: {}", other))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceAction::Stats => "stats",
            MaintenanceAction::Prune => "prune",
            MaintenanceAction::Clear => "clear",
        }
    }
}

/// Retention window for a maintenance `older_than` token
pub fn retention_window(token: &str) -> Duration {
    match token {
        "1h" => Duration::hours(1),
        "6h" => Duration::hours(6),
        "24h" => Duration::hours(24),
        "7d" => Duration::days(7),
        "14d" => Duration::days(14),
        "21d" => Duration::days(21),
        "60d" => Duration::days(60),
        "90d" => Duration::days(90),
        _ => Duration::days(30),
    }
}

pub struct MaintenanceTool {
    repository: Arc<dyn EntryRepository>,
}

impl MaintenanceTool {
    pub const NAME: &'static str = "maintenance";

    pub fn new(repository: Arc<dyn EntryRepository>) -> Self {
        Self { repository }
    }

    pub async fn execute(
        &self,
        action: MaintenanceAction,
        args: &QueryArgs,
        now: DateTime<Utc>,
    ) -> Result<Value, AppError> {
        match action {
            MaintenanceAction::Stats => self.stats().await,
            MaintenanceAction::Prune => self.prune(args, now).await,
            MaintenanceAction::Clear => self.clear(args).await,
        }
    }

    async fn stats(&self) -> Result<Value, AppError> {
        let stats = self.repository.stats().await?;
        Ok(serde_json::to_value(stats)?)
    }

    async fn prune(&self, args: &QueryArgs, now: DateTime<Utc>) -> Result<Value, AppError> {
        require_confirmation(args)?;

        let older_than = args.older_than.as_deref().unwrap_or(DEFAULT_RETENTION);
        let (type_label, entry_type) = entry_type_filter(args)?;
        let cutoff = now - retention_window(older_than);

        let deleted = self
            .repository
            .delete_where(&DeleteFilter {
                entry_type,
                created_before: Some(cutoff),
            })
            .await?;

        crate::metrics::record_entries_deleted("prune", deleted);
        tracing::info!(
            deleted = deleted,
            entry_type = %type_label,
            older_than = %older_than,
            "Pruned stored entries"
        );

        Ok(json!({
            "success": true,
            "message": format!("Pruned {} entries older than {}", deleted, older_than),
            "deleted_count": deleted,
            "entry_type": type_label,
            "older_than": older_than,
            "cutoff_time": cutoff.format(TIMESTAMP_FORMAT).to_string(),
        }))
    }

    async fn clear(&self, args: &QueryArgs) -> Result<Value, AppError> {
        require_confirmation(args)?;

        let (type_label, entry_type) = entry_type_filter(args)?;
        let deleted = self
            .repository
            .delete_where(&DeleteFilter {
                entry_type,
                created_before: None,
            })
            .await?;

        crate::metrics::record_entries_deleted("clear", deleted);
        tracing::info!(deleted = deleted, entry_type = %type_label, "Cleared stored entries");

        Ok(json!({
            "success": true,
            "message": format!("Cleared {} entries", deleted),
            "deleted_count": deleted,
            "entry_type": type_label,
        }))
    }
}

fn require_confirmation(args: &QueryArgs) -> Result<(), AppError> {
    if !args.confirm {
        return Err(AppError::InvalidArgument(
            "Destructive operation requires confirm=true parameter".to_string(),
        ));
    }
    Ok(())
}

/// `entry_type` argument: `all` (default) or a single entry type
fn entry_type_filter(args: &QueryArgs) -> Result<(String, Option<EntryType>), AppError> {
    match args.entry_type.as_deref() {
        None | Some("all") => Ok(("all".to_string(), None)),
        Some(tag) => {
            let entry_type: EntryType = tag.parse()?;
            Ok((entry_type.as_str().to_string(), Some(entry_type)))
        }
    }
}
