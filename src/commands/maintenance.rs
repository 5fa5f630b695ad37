use anyhow::Result;
use clap::Parser;
use entry_lens::query::MaintenanceTool;
use entry_lens::{Config, QueryArgs};
use std::sync::Arc;

#[derive(Debug, Clone, Parser)]
pub struct MaintenanceArgs {
    /// stats, prune or clear
    #[arg(default_value = "stats")]
    pub action: String,

    /// Retention period for prune (1h, 6h, 24h, 7d, 14d, 21d, 30d, 60d, 90d)
    #[arg(long)]
    pub older_than: Option<String>,

    /// Restrict prune/clear to one entry type
    #[arg(long)]
    pub entry_type: Option<String>,

    /// Required for prune and clear
    #[arg(long)]
    pub confirm: bool,

    /// Print the raw envelope as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the maintenance command
pub async fn execute(cfg: Arc<Config>, args: MaintenanceArgs) -> Result<()> {
    let engine = super::open_engine(cfg).await?;

    let query = QueryArgs {
        action: Some(args.action.clone()),
        older_than: args.older_than.clone(),
        entry_type: args.entry_type.clone(),
        confirm: args.confirm,
        ..Default::default()
    };

    let envelope = engine.execute(MaintenanceTool::NAME, query).await;
    super::print_envelope(&format!("maintenance {}", args.action), &envelope, args.json)
}
