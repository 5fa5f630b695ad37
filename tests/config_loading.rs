/// Integration tests for layered configuration loading
use entry_lens::config::{load_config_from, MatchingStrategy};
use std::io::Write;
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_missing_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

    assert_eq!(cfg.pagination.default_limit, 10);
    assert_eq!(cfg.pagination.max_limit, 25);
    assert_eq!(cfg.thresholds.slow_request_ms, 1000.0);
    assert!(cfg.overview.route_groups.is_empty());
}

#[test]
fn test_route_groups_from_file() {
    let file = write_config(
        r#"
[logging]
level = "debug"
format = "json"

[overview]
matching_strategy = "all"

[[overview.route_groups]]
name = "api"
middleware = ["api", "auth:*"]

[[overview.route_groups]]
name = "admin"
uri_prefix = "/admin"
matching_strategy = "any"

[overview.exclude]
uris = ["telescope/*", "horizon/*"]

[overview.thresholds.api]
slow_request_ms = 250.0
acceptable_error_rate = 0.01
"#,
    );

    let cfg = load_config_from(file.path()).unwrap();
    assert_eq!(cfg.logging.level, "debug");
    assert_eq!(cfg.logging.format, "json");
    assert_eq!(cfg.overview.matching_strategy, MatchingStrategy::All);
    assert_eq!(cfg.overview.route_groups.len(), 2);
    assert_eq!(cfg.overview.route_groups[0].middleware, vec!["api", "auth:*"]);
    assert_eq!(
        cfg.overview.route_groups[1].matching_strategy,
        Some(MatchingStrategy::Any)
    );
    assert_eq!(cfg.overview.exclude.uris.len(), 2);
    assert_eq!(cfg.overview.thresholds["api"].slow_request_ms, Some(250.0));
}

#[test]
fn test_invalid_file_is_rejected() {
    let file = write_config(
        r#"
[pagination]
default_limit = 50
max_limit = 25
"#,
    );

    let err = load_config_from(file.path()).unwrap_err();
    assert!(err.to_string().contains("default_limit"));
}

#[test]
fn test_reserved_group_name_is_rejected() {
    let file = write_config(
        r#"
[[overview.route_groups]]
name = "other"
"#,
    );

    assert!(load_config_from(file.path()).is_err());
}

#[test]
fn test_global_thresholds_section() {
    let file = write_config(
        r#"
[thresholds]
slow_query_ms = 250.0
"#,
    );

    let cfg = load_config_from(file.path()).unwrap();
    assert_eq!(cfg.thresholds.slow_query_ms, 250.0);
    assert_eq!(cfg.thresholds.slow_request_ms, 1000.0);
}
