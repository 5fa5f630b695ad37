use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

mod cli;
mod commands;

use entry_lens::{config, init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    if let cli::Commands::Version = args.command {
        println!("entry-lens v{}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let cfg = Arc::new(config::load_config_from(&args.config)?);
    init_tracing(&cfg.logging);
    entry_lens::metrics::describe_metrics();

    match args.command {
        cli::Commands::Query(query) => commands::query::execute(cfg, query).await?,
        cli::Commands::Maintenance(maintenance) => {
            commands::maintenance::execute(cfg, maintenance).await?
        }
        cli::Commands::Ingest { file } => commands::ingest::execute(cfg, &file).await?,
        cli::Commands::Config { action } => match action {
            cli::ConfigCommands::Show => commands::config::show(&cfg)?,
            cli::ConfigCommands::Validate => commands::config::validate(&cfg, &args.config)?,
        },
        cli::Commands::Version => {}
    }

    Ok(())
}
