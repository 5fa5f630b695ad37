use clap::{Parser, Subcommand};
use std::path::PathBuf;

use entry_lens::config::DEFAULT_CONFIG_FILE;

#[derive(Parser, Debug)]
#[command(name = "entry-lens", version, about = "Query application telemetry entries")]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run a query tool (requests, queries, jobs, logs, exceptions, ...)
    Query(crate::commands::query::QueryCommandArgs),

    /// Storage statistics and cleanup
    Maintenance(crate::commands::maintenance::MaintenanceArgs),

    /// Load entries from a JSON Lines file into storage
    Ingest {
        /// Path to a file with one JSON entry per line
        file: PathBuf,
    },

    /// Configuration management commands
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show version information
    Version,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Display the effective configuration
    Show,

    /// Validate configuration file
    Validate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing_query() {
        let args = vec![
            "entry-lens", "query", "requests", "--action", "stats", "--period", "24h", "--json",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Query(query) => {
                assert_eq!(query.tool, "requests");
                assert_eq!(query.action.as_deref(), Some("stats"));
                assert_eq!(query.period.as_deref(), Some("24h"));
                assert!(query.json);
            }
            _ => panic!("Expected Query command"),
        }
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_cli_parsing_maintenance() {
        let args = vec![
            "entry-lens", "-c", "custom.toml", "maintenance", "prune", "--older-than", "7d",
            "--confirm",
        ];
        let cli = Cli::try_parse_from(args).unwrap();

        match cli.command {
            Commands::Maintenance(maintenance) => {
                assert_eq!(maintenance.action, "prune");
                assert_eq!(maintenance.older_than.as_deref(), Some("7d"));
                assert!(maintenance.confirm);
            }
            _ => panic!("Expected Maintenance command"),
        }
        assert_eq!(cli.config, PathBuf::from("custom.toml"));
    }

    #[test]
    fn test_cli_parsing_maintenance_defaults_to_stats() {
        let cli = Cli::try_parse_from(vec!["entry-lens", "maintenance"]).unwrap();
        match cli.command {
            Commands::Maintenance(maintenance) => {
                assert_eq!(maintenance.action, "stats");
                assert!(!maintenance.confirm);
            }
            _ => panic!("Expected Maintenance command"),
        }
    }

    #[test]
    fn test_cli_parsing_config_validate() {
        let cli = Cli::try_parse_from(vec!["entry-lens", "config", "validate"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Config {
                action: ConfigCommands::Validate
            }
        ));
    }

    #[test]
    fn test_cli_requires_subcommand() {
        assert!(Cli::try_parse_from(vec!["entry-lens"]).is_err());
    }
}
