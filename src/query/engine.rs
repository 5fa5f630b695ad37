//! Entry query engine
//!
//! One evaluation fetches the tool's entries from storage once, keeps those
//! inside the requested time window, lets the tool narrow them further and
//! then shapes the result for the requested action. Every path, including
//! failures, produces an [`Envelope`].

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::entry::{scalar_string, Entry};
use crate::error::{error_type_name, AppError};
use crate::query::args::{Action, QueryArgs};
use crate::query::formatter::{Envelope, ResponseFormatter};
use crate::query::maintenance::{MaintenanceAction, MaintenanceTool};
use crate::query::pagination::PaginationManager;
use crate::query::period::Period;
use crate::query::route_filter::RouteFilter;
use crate::storage::{EntryQueryOptions, EntryRepository};
use crate::tools::{summary_stats, EntryTool, ToolContext, ToolRegistry};

/// Upper bound on entries scanned by a `prune` action
pub const PRUNE_SCAN_LIMIT: usize = 100_000;

/// Retention window used by `prune` when `older_than` is absent
pub const DEFAULT_PRUNE_PERIOD: &str = "30d";

/// Source of the evaluation timestamp
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct EntryQueryEngine {
    repository: Arc<dyn EntryRepository>,
    config: Arc<Config>,
    registry: ToolRegistry,
    pagination: PaginationManager,
    formatter: ResponseFormatter,
    route_filter: RouteFilter,
    maintenance: MaintenanceTool,
    clock: Clock,
}

impl EntryQueryEngine {
    /// Build an engine with every built-in tool
    ///
    /// Route patterns are compiled here, so a bad pattern fails construction
    /// rather than a later query.
    pub fn new(repository: Arc<dyn EntryRepository>, config: Arc<Config>) -> Result<Self, AppError> {
        let route_filter = RouteFilter::new(&config.overview, config.thresholds.slow_request_ms)?;

        Ok(Self {
            maintenance: MaintenanceTool::new(repository.clone()),
            repository,
            pagination: PaginationManager::new(&config.pagination),
            formatter: ResponseFormatter::new(),
            registry: ToolRegistry::with_defaults(),
            route_filter,
            config,
            clock: Arc::new(Utc::now),
        })
    }

    pub fn with_registry(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Replace the wall clock, mainly for deterministic tests
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    pub fn route_filter(&self) -> &RouteFilter {
        &self.route_filter
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run `tool` with arguments taken from a raw JSON mapping
    pub async fn execute_value(&self, tool: &str, args: Value) -> Envelope {
        match QueryArgs::from_value(args) {
            Ok(args) => self.execute(tool, args).await,
            Err(e) => {
                tracing::warn!(tool = %tool, error = %e, "Rejected malformed arguments");
                e.to_envelope()
            }
        }
    }

    /// Run `tool` (an entry tool or `maintenance`) and wrap the outcome
    pub async fn execute(&self, tool: &str, args: QueryArgs) -> Envelope {
        let started = Instant::now();
        let now = (self.clock)();

        let (tool_label, action_label, result) = if tool == MaintenanceTool::NAME {
            match MaintenanceAction::parse(args.action.as_deref()) {
                Ok(action) => {
                    let result = self
                        .maintenance
                        .execute(action, &args, now)
                        .await
                        .map(|payload| self.formatter.format(payload));
                    (MaintenanceTool::NAME, action.as_str(), result)
                }
                Err(e) => (MaintenanceTool::NAME, "unknown", Err(e)),
            }
        } else {
            match self.registry.get(tool) {
                Some(entry_tool) => {
                    let action = Action::parse(args.action.as_deref());
                    let result = self.dispatch(entry_tool.as_ref(), action, &args, now).await;
                    (entry_tool.name(), action.as_str(), result)
                }
                None => (
                    "unknown",
                    "unknown",
                    Err(AppError::InvalidArgument(format!("Unknown tool: {}", tool))),
                ),
            }
        };

        let elapsed = started.elapsed();
        match result {
            Ok(envelope) => {
                crate::metrics::record_execution(tool_label, action_label, "success", elapsed);
                tracing::debug!(
                    tool = %tool_label,
                    action = %action_label,
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Tool execution completed"
                );
                envelope
            }
            Err(e) => {
                crate::metrics::record_execution(tool_label, action_label, error_type_name(&e), elapsed);
                tracing::warn!(
                    tool = %tool,
                    action = %action_label,
                    error = %e,
                    "Tool execution failed"
                );
                e.to_envelope()
            }
        }
    }

    async fn dispatch(
        &self,
        tool: &dyn EntryTool,
        action: Action,
        args: &QueryArgs,
        now: DateTime<Utc>,
    ) -> Result<Envelope, AppError> {
        tracing::debug!(tool = %tool.name(), action = %action, "Dispatching entry query");

        match action {
            Action::Detail => return self.detail(args).await,
            Action::Prune if tool.supports_prune() => return self.prune(tool, args, now).await,
            _ => {}
        }

        let ctx = ToolContext {
            config: &self.config,
            route_filter: &self.route_filter,
            limit: self.pagination.limit(args.limit),
        };
        let entries = self.load_entries(tool, args, &ctx, now).await?;

        match action {
            Action::Summary => Ok(self.summary(tool, &entries, args)),
            Action::Stats => Ok(self
                .formatter
                .format_stats(tool.statistics(&entries, args, &ctx))),
            Action::Search => self.search(tool, entries, args, &ctx, now),
            Action::List => self.list(tool, entries, args, &ctx, now),
            _ => match tool.specialty(action, &entries, args, &ctx) {
                Some(payload) => Ok(self.formatter.format(payload?)),
                // Actions a tool does not offer behave like `list`
                None => self.list(tool, entries, args, &ctx, now),
            },
        }
    }

    /// Fetch, apply the time window, then tool-specific narrowing
    async fn load_entries(
        &self,
        tool: &dyn EntryTool,
        args: &QueryArgs,
        ctx: &ToolContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Entry>, AppError> {
        let options = EntryQueryOptions {
            limit: self.config.storage.fetch_limit,
            tag: args.tag.clone(),
            family_hash: args.family_hash.clone(),
            before_sequence: args.before,
        };

        let fetched = self.repository.get(tool.entry_type(), &options).await?;
        crate::metrics::record_entries_scanned(tool.name(), fetched.len());

        let period = self.period(tool, args);
        let in_window: Vec<Entry> = fetched
            .into_iter()
            .filter(|entry| period.contains(now, entry.created_at))
            .collect();

        Ok(tool.narrow(in_window, args, ctx))
    }

    fn period(&self, tool: &dyn EntryTool, args: &QueryArgs) -> Period {
        Period::parse_or(args.period.as_deref(), tool.default_period())
    }

    fn summary(&self, tool: &dyn EntryTool, entries: &[Entry], args: &QueryArgs) -> Envelope {
        self.formatter.format_summary(
            entries.len(),
            tool.entry_type().as_str(),
            self.period(tool, args).as_str(),
            summary_stats(entries, tool.summary_field()),
        )
    }

    fn list(
        &self,
        tool: &dyn EntryTool,
        entries: Vec<Entry>,
        args: &QueryArgs,
        ctx: &ToolContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<Envelope, AppError> {
        let offset = self.offset(args);
        let total = entries.len();

        let page: Vec<Value> = entries
            .iter()
            .skip(offset)
            .take(ctx.limit)
            .map(Entry::normalized)
            .collect();
        let records = self.formatter.format_list(&page, tool.list_fields());

        let page = self.pagination.paginate(records, total, ctx.limit, offset, now);
        Ok(self.formatter.format(serde_json::to_value(page)?))
    }

    fn search(
        &self,
        tool: &dyn EntryTool,
        entries: Vec<Entry>,
        args: &QueryArgs,
        ctx: &ToolContext<'_>,
        now: DateTime<Utc>,
    ) -> Result<Envelope, AppError> {
        let needle = args.query.as_deref().unwrap_or("").to_lowercase();

        let matched = if needle.is_empty() {
            entries
        } else {
            entries
                .into_iter()
                .filter(|entry| {
                    searchable_content(entry, tool.searchable_fields())
                        .to_lowercase()
                        .contains(&needle)
                })
                .collect()
        };

        self.list(tool, matched, args, ctx, now)
    }

    /// A decodable cursor wins over `offset`
    fn offset(&self, args: &QueryArgs) -> usize {
        args.cursor
            .as_deref()
            .and_then(|cursor| self.pagination.decode_cursor(cursor))
            .map(|cursor| cursor.value.max(0) as usize)
            .unwrap_or_else(|| args.offset())
    }

    async fn detail(&self, args: &QueryArgs) -> Result<Envelope, AppError> {
        let id = args
            .id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AppError::InvalidArgument("The detail action requires an id".to_string()))?;

        let entry = self
            .repository
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;

        Ok(self.formatter.format_detail(entry.detail()))
    }

    /// Delete the tool's entries older than `older_than`, one at a time
    async fn prune(
        &self,
        tool: &dyn EntryTool,
        args: &QueryArgs,
        now: DateTime<Utc>,
    ) -> Result<Envelope, AppError> {
        let older_than = args.older_than.as_deref().unwrap_or(DEFAULT_PRUNE_PERIOD);
        let cutoff = Period::parse_or(Some(older_than), Period::OneHour).cutoff(now);

        let entries = self
            .repository
            .get(tool.entry_type(), &EntryQueryOptions::with_limit(PRUNE_SCAN_LIMIT))
            .await?;

        let (mut deleted, mut failed) = (0u64, 0u64);
        for entry in entries.iter().filter(|e| e.created_at < cutoff) {
            match self.repository.delete(&entry.id).await {
                Ok(true) => deleted += 1,
                Ok(false) => {}
                Err(e) => {
                    failed += 1;
                    tracing::warn!(entry_id = %entry.id, error = %e, "Failed to delete entry during prune");
                }
            }
        }

        crate::metrics::record_entries_deleted("prune", deleted);
        tracing::info!(
            tool = %tool.name(),
            deleted = deleted,
            failed = failed,
            older_than = %older_than,
            "Pruned entries"
        );

        Ok(self.formatter.format(json!({
            "success": true,
            "message": format!(
                "Pruned {} {} entries older than {}",
                deleted,
                tool.entry_type(),
                older_than
            ),
            "deleted_count": deleted,
            "failed_count": failed,
            "period": older_than,
            "cutoff_timestamp": cutoff.timestamp(),
        })))
    }
}

/// Space-joined text of the entry's searchable fields
///
/// Absent and `null` fields are skipped; arrays and objects contribute their
/// JSON encoding.
pub fn searchable_content(entry: &Entry, fields: &[&str]) -> String {
    fields
        .iter()
        .filter_map(|field| entry.field(field).and_then(scalar_string))
        .collect::<Vec<_>>()
        .join(" ")
}
