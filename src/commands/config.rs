use anyhow::Result;
use colored::Colorize;
use entry_lens::config::{Config, MatchingStrategy};
use std::path::Path;
use tracing::info;

/// Execute the config show command
///
/// Displays the effective configuration after file and environment layering
pub fn show(cfg: &Config) -> Result<()> {
    info!("Displaying configuration");

    println!("{}", "Current Configuration:".green().bold());
    println!();

    let toml_string = toml::to_string_pretty(cfg)?;
    println!("{}", toml_string);

    Ok(())
}

/// Execute the config validate command
///
/// Loading already validated the file; this prints a summary of what it holds
pub fn validate(cfg: &Config, path: &Path) -> Result<()> {
    println!("{}", "Validating configuration...".yellow());
    info!(path = %path.display(), "Validating configuration file");

    if !path.exists() {
        println!(
            "{}",
            format!("No file at {}, using defaults", path.display()).yellow()
        );
    }

    println!("{}", "✓ Configuration is valid".green());
    println!();
    println!("{}", "Summary:".bold());
    println!("  Database: {}", cfg.storage.database_path);
    println!(
        "  Pagination: default {} / max {}",
        cfg.pagination.default_limit, cfg.pagination.max_limit
    );
    println!(
        "  Route Groups: {} ({})",
        cfg.overview.route_groups.len(),
        strategy_name(cfg.overview.matching_strategy)
    );
    println!("  Exclusion Rules: {}", exclusion_count(cfg));

    Ok(())
}

fn strategy_name(strategy: MatchingStrategy) -> &'static str {
    match strategy {
        MatchingStrategy::Any => "match any",
        MatchingStrategy::All => "match all",
    }
}

fn exclusion_count(cfg: &Config) -> usize {
    let exclude = &cfg.overview.exclude;
    exclude.uris.len() + exclude.middleware.len() + exclude.controller_actions.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exclusion_count() {
        let mut cfg = Config::default();
        cfg.overview.exclude.uris = vec!["/health".to_string(), "/_debug/*".to_string()];
        cfg.overview.exclude.middleware = vec!["internal".to_string()];
        assert_eq!(exclusion_count(&cfg), 3);
    }

    #[test]
    fn test_default_config_serializes() {
        let rendered = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(rendered.contains("database_path"));
    }
}
