use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// Default configuration file consulted by [`load_config`]
pub const DEFAULT_CONFIG_FILE: &str = "entry-lens.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pagination: PaginationConfig,
    #[serde(default)]
    pub thresholds: ThresholdConfig,
    #[serde(default)]
    pub overview: OverviewConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_log_level")]
    pub level: String,
    /// `text` or `json`
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    /// Upper bound on entries fetched per query evaluation
    #[serde(default = "default_fetch_limit")]
    pub fetch_limit: usize,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            fetch_limit: default_fetch_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct PaginationConfig {
    #[serde(default = "default_page_limit")]
    pub default_limit: i64,
    #[serde(default = "default_max_limit")]
    pub max_limit: i64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            default_limit: default_page_limit(),
            max_limit: default_max_limit(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct ThresholdConfig {
    #[serde(default = "default_slow_request_ms")]
    pub slow_request_ms: f64,
    #[serde(default = "default_slow_query_ms")]
    pub slow_query_ms: f64,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            slow_request_ms: default_slow_request_ms(),
            slow_query_ms: default_slow_query_ms(),
        }
    }
}

/// How a route group's middleware patterns are combined
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchingStrategy {
    /// At least one group pattern matches some request middleware
    #[default]
    Any,
    /// Every group pattern matches some request middleware
    All,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OverviewConfig {
    #[serde(default)]
    pub matching_strategy: MatchingStrategy,
    /// Evaluated in declared order, first match wins
    #[serde(default)]
    pub route_groups: Vec<RouteGroupConfig>,
    #[serde(default)]
    pub exclude: ExclusionConfig,
    /// Per route group overrides, keyed by group name
    #[serde(default)]
    pub thresholds: HashMap<String, RouteThresholdConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteGroupConfig {
    pub name: String,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub uri_prefix: Option<String>,
    /// Falls back to `overview.matching_strategy`
    #[serde(default)]
    pub matching_strategy: Option<MatchingStrategy>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ExclusionConfig {
    #[serde(default)]
    pub uris: Vec<String>,
    #[serde(default)]
    pub middleware: Vec<String>,
    #[serde(default)]
    pub controller_actions: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize)]
pub struct RouteThresholdConfig {
    pub slow_request_ms: Option<f64>,
    pub acceptable_error_rate: Option<f64>,
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_database_path() -> String {
    "./data/entries.db".to_string()
}

fn default_fetch_limit() -> usize {
    10_000
}

fn default_page_limit() -> i64 {
    10
}

fn default_max_limit() -> i64 {
    25
}

fn default_slow_request_ms() -> f64 {
    1000.0
}

fn default_slow_query_ms() -> f64 {
    100.0
}

/// Load configuration from `entry-lens.toml` (optional) and `ENTRY_LENS__*` env vars
pub fn load_config() -> anyhow::Result<Config> {
    load_config_from(Path::new(DEFAULT_CONFIG_FILE))
}

pub fn load_config_from(path: &Path) -> anyhow::Result<Config> {
    let config = config::Config::builder()
        .add_source(config::File::from(path).required(false))
        .add_source(config::Environment::with_prefix("ENTRY_LENS").separator("__"))
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    // Validate pagination bounds
    if cfg.pagination.max_limit < 1 {
        anyhow::bail!("pagination.max_limit must be at least 1");
    }
    if cfg.pagination.default_limit < 1 || cfg.pagination.default_limit > cfg.pagination.max_limit {
        anyhow::bail!(
            "pagination.default_limit must be between 1 and {}",
            cfg.pagination.max_limit
        );
    }

    if cfg.storage.fetch_limit == 0 {
        anyhow::bail!("storage.fetch_limit must be greater than 0");
    }

    if cfg.thresholds.slow_request_ms < 0.0 || cfg.thresholds.slow_query_ms < 0.0 {
        anyhow::bail!("Slow thresholds cannot be negative");
    }

    // Validate route groups
    let mut seen = HashSet::new();
    for group in &cfg.overview.route_groups {
        if group.name.is_empty() {
            anyhow::bail!("Route group name cannot be empty");
        }
        if group.name == "other" || group.name == "all" {
            anyhow::bail!("Route group name '{}' is reserved", group.name);
        }
        if !seen.insert(group.name.as_str()) {
            anyhow::bail!("Duplicate route group '{}'", group.name);
        }
    }

    for (group, thresholds) in &cfg.overview.thresholds {
        if thresholds.slow_request_ms.is_some_and(|v| v < 0.0) {
            anyhow::bail!("Route group '{}' has a negative slow_request_ms", group);
        }
        if thresholds
            .acceptable_error_rate
            .is_some_and(|v| !(0.0..=1.0).contains(&v))
        {
            anyhow::bail!(
                "Route group '{}' acceptable_error_rate must be between 0 and 1",
                group
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.pagination.default_limit, 10);
        assert_eq!(cfg.pagination.max_limit, 25);
        assert_eq!(cfg.thresholds.slow_request_ms, 1000.0);
        assert_eq!(cfg.thresholds.slow_query_ms, 100.0);
        assert_eq!(cfg.overview.matching_strategy, MatchingStrategy::Any);
        assert!(validate_config(&cfg).is_ok());
    }

    #[test]
    fn test_validate_config_rejects_reserved_group() {
        let mut cfg = create_test_config();
        cfg.overview.route_groups[0].name = "other".to_string();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("reserved"));
    }

    #[test]
    fn test_validate_config_rejects_duplicate_group() {
        let mut cfg = create_test_config();
        cfg.overview.route_groups[1].name = "api".to_string();

        let result = validate_config(&cfg);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate route group"));
    }

    #[test]
    fn test_validate_config_rejects_bad_pagination() {
        let mut cfg = create_test_config();
        cfg.pagination.default_limit = 50;

        assert!(validate_config(&cfg).is_err());
    }

    #[test]
    fn test_validate_config_rejects_bad_error_rate() {
        let mut cfg = create_test_config();
        cfg.overview.thresholds.insert(
            "api".to_string(),
            RouteThresholdConfig {
                slow_request_ms: Some(200.0),
                acceptable_error_rate: Some(1.5),
            },
        );

        assert!(validate_config(&cfg).is_err());
    }

    fn create_test_config() -> Config {
        let mut cfg = Config::default();
        cfg.overview.route_groups = vec![
            RouteGroupConfig {
                name: "api".to_string(),
                middleware: vec!["api".to_string()],
                uri_prefix: None,
                matching_strategy: None,
            },
            RouteGroupConfig {
                name: "web".to_string(),
                middleware: vec!["web".to_string()],
                uri_prefix: None,
                matching_strategy: None,
            },
        ];
        cfg
    }
}
