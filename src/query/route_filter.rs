//! Route group classification for request entries
//!
//! Requests are first checked against the exclusion rules; an excluded
//! request belongs to no group at all. Otherwise route groups are tried in
//! declared order and the first match wins, with `other` catching the rest.

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::config::{MatchingStrategy, OverviewConfig, RouteThresholdConfig};
use crate::entry::{Entry, RequestContent};
use crate::error::AppError;
use crate::query::pattern::{compile_all, WildcardPattern};
use crate::stats::{percentile, round_to};

/// Catch-all group for requests that match no configured group
pub const OTHER_GROUP: &str = "other";

/// Error rate tolerated when a group configures none
pub const DEFAULT_ACCEPTABLE_ERROR_RATE: f64 = 0.05;

#[derive(Debug, Clone)]
struct RouteGroup {
    name: String,
    middleware: Vec<WildcardPattern>,
    uri_prefix: Option<String>,
    strategy: MatchingStrategy,
}

impl RouteGroup {
    fn matches(&self, request: &RequestContent) -> bool {
        let middleware_match = if self.middleware.is_empty() {
            true
        } else {
            let matched = self
                .middleware
                .iter()
                .filter(|pattern| request.middleware.iter().any(|m| pattern.matches(m)))
                .count();

            match self.strategy {
                MatchingStrategy::Any => matched > 0,
                MatchingStrategy::All => matched == self.middleware.len(),
            }
        };

        let uri_match = self
            .uri_prefix
            .as_deref()
            .map_or(true, |prefix| request.uri.starts_with(prefix));

        middleware_match && uri_match
    }
}

#[derive(Debug, Clone, Default)]
struct Exclusions {
    uris: Vec<WildcardPattern>,
    middleware: Vec<WildcardPattern>,
    controller_actions: Vec<WildcardPattern>,
}

/// Effective thresholds for one route group
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RouteThresholds {
    pub slow_request_ms: f64,
    pub acceptable_error_rate: f64,
}

/// Per-group aggregate in a route breakdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteGroupStats {
    #[serde(skip)]
    pub name: String,
    pub request_count: usize,
    pub total_duration_ms: f64,
    pub avg_response_time_ms: f64,
    pub error_count: usize,
    pub error_rate: f64,
    pub p95_response_time_ms: f64,
    pub exceeds_error_budget: bool,
}

/// Compiled route classification rules
#[derive(Debug, Clone)]
pub struct RouteFilter {
    groups: Vec<RouteGroup>,
    exclusions: Exclusions,
    thresholds: HashMap<String, RouteThresholdConfig>,
    slow_request_ms: f64,
}

impl RouteFilter {
    /// Compile the overview rules; `slow_request_ms` is the global fallback threshold
    pub fn new(overview: &OverviewConfig, slow_request_ms: f64) -> Result<Self, AppError> {
        let groups = overview
            .route_groups
            .iter()
            .map(|group| {
                Ok(RouteGroup {
                    name: group.name.clone(),
                    middleware: compile_all(&group.middleware)?,
                    uri_prefix: group.uri_prefix.clone(),
                    strategy: group.matching_strategy.unwrap_or(overview.matching_strategy),
                })
            })
            .collect::<Result<Vec<_>, AppError>>()?;

        let exclusions = Exclusions {
            uris: compile_all(&overview.exclude.uris)?,
            middleware: compile_all(&overview.exclude.middleware)?,
            controller_actions: compile_all(&overview.exclude.controller_actions)?,
        };

        Ok(Self {
            groups,
            exclusions,
            thresholds: overview.thresholds.clone(),
            slow_request_ms,
        })
    }

    /// Names of the configured groups in evaluation order
    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.iter().map(|g| g.name.as_str())
    }

    /// Route group for a request, or `None` when the request is excluded
    pub fn categorize(&self, request: &RequestContent) -> Option<&str> {
        if self.should_exclude(request) {
            return None;
        }

        let group = self
            .groups
            .iter()
            .find(|group| group.matches(request))
            .map(|group| group.name.as_str());

        Some(group.unwrap_or(OTHER_GROUP))
    }

    pub fn should_exclude(&self, request: &RequestContent) -> bool {
        if self.exclusions.uris.iter().any(|p| p.matches(&request.uri)) {
            return true;
        }

        if self
            .exclusions
            .middleware
            .iter()
            .any(|p| request.middleware.iter().any(|m| p.matches(m)))
        {
            return true;
        }

        self.exclusions
            .controller_actions
            .iter()
            .any(|p| p.matches(&request.controller_action))
    }

    /// Keep requests in `route_type`; `None` or `all` keeps every non-excluded request
    pub fn filter_requests(&self, entries: Vec<Entry>, route_type: Option<&str>) -> Vec<Entry> {
        let wanted = route_type.filter(|r| *r != "all");

        entries
            .into_iter()
            .filter(|entry| {
                let request = RequestContent::from_entry(entry);
                match (self.categorize(&request), wanted) {
                    (None, _) => false,
                    (Some(_), None) => true,
                    (Some(group), Some(wanted)) => group == wanted,
                }
            })
            .collect()
    }

    /// Aggregate requests per group, skipping excluded requests and empty groups
    pub fn route_breakdown(&self, entries: &[Entry]) -> Vec<RouteGroupStats> {
        let mut order: Vec<&str> = self.group_names().collect();
        order.push(OTHER_GROUP);

        let mut samples: HashMap<&str, (Vec<f64>, usize)> = HashMap::new();
        for entry in entries {
            let request = RequestContent::from_entry(entry);
            let Some(group) = self.categorize(&request) else {
                continue;
            };

            let slot = samples.entry(group).or_default();
            slot.0.push(request.duration);
            if request.response_status.unwrap_or(200) >= 400 {
                slot.1 += 1;
            }
        }

        order
            .into_iter()
            .filter_map(|name| {
                let (durations, errors) = samples.get(name)?;
                if durations.is_empty() {
                    return None;
                }

                let count = durations.len();
                let total: f64 = durations.iter().sum();
                let error_rate = round_to(*errors as f64 / count as f64, 4);

                Some(RouteGroupStats {
                    name: name.to_string(),
                    request_count: count,
                    total_duration_ms: round_to(total, 2),
                    avg_response_time_ms: round_to(total / count as f64, 2),
                    error_count: *errors,
                    error_rate,
                    p95_response_time_ms: round_to(percentile(durations, 95.0), 2),
                    exceeds_error_budget: error_rate
                        > self.thresholds(name).acceptable_error_rate,
                })
            })
            .collect()
    }

    /// Breakdown rendered as a JSON object keyed by group name
    pub fn route_breakdown_value(&self, entries: &[Entry]) -> Value {
        let map: Map<String, Value> = self
            .route_breakdown(entries)
            .into_iter()
            .map(|stats| {
                let name = stats.name.clone();
                (name, serde_json::to_value(stats).unwrap_or(Value::Null))
            })
            .collect();
        Value::Object(map)
    }

    /// Thresholds for `route_type`, falling back to global defaults
    pub fn thresholds(&self, route_type: &str) -> RouteThresholds {
        let configured = self.thresholds.get(route_type).copied().unwrap_or_default();

        RouteThresholds {
            slow_request_ms: configured.slow_request_ms.unwrap_or(self.slow_request_ms),
            acceptable_error_rate: configured
                .acceptable_error_rate
                .unwrap_or(DEFAULT_ACCEPTABLE_ERROR_RATE),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExclusionConfig, RouteGroupConfig};
    use crate::entry::EntryType;
    use chrono::Utc;
    use serde_json::json;

    fn group(name: &str, middleware: &[&str]) -> RouteGroupConfig {
        RouteGroupConfig {
            name: name.to_string(),
            middleware: middleware.iter().map(|m| m.to_string()).collect(),
            uri_prefix: None,
            matching_strategy: None,
        }
    }

    fn overview() -> OverviewConfig {
        OverviewConfig {
            route_groups: vec![group("api", &["api"]), group("web", &["web"])],
            exclude: ExclusionConfig {
                uris: vec!["telescope/*".to_string()],
                middleware: vec![],
                controller_actions: vec!["*HealthController@*".to_string()],
            },
            ..Default::default()
        }
    }

    fn request(uri: &str, middleware: &[&str]) -> RequestContent {
        RequestContent {
            uri: uri.to_string(),
            middleware: middleware.iter().map(|m| m.to_string()).collect(),
            ..Default::default()
        }
    }

    fn entry(id: &str, uri: &str, middleware: &[&str], duration: f64, status: i64) -> Entry {
        Entry::new(
            id,
            EntryType::Request,
            json!({
                "uri": uri,
                "middleware": middleware,
                "duration": duration,
                "response_status": status,
            }),
            Utc::now(),
        )
    }

    #[test]
    fn test_categorize_first_match_and_other() {
        let filter = RouteFilter::new(&overview(), 1000.0).unwrap();
        assert_eq!(filter.categorize(&request("/", &["web", "auth"])), Some("web"));
        assert_eq!(filter.categorize(&request("/x", &["api", "web"])), Some("api"));
        assert_eq!(filter.categorize(&request("/x", &["custom"])), Some("other"));
        assert_eq!(filter.categorize(&request("/x", &[])), Some("other"));
    }

    #[test]
    fn test_exclusion_precedes_groups() {
        let filter = RouteFilter::new(&overview(), 1000.0).unwrap();
        assert_eq!(filter.categorize(&request("telescope/abc", &["web"])), None);

        let mut health = request("/health", &["api"]);
        health.controller_action = "App\\Http\\HealthController@show".to_string();
        assert!(filter.should_exclude(&health));
    }

    #[test]
    fn test_all_strategy_and_uri_prefix() {
        let mut config = overview();
        config.route_groups = vec![
            RouteGroupConfig {
                name: "admin".to_string(),
                middleware: vec!["web".to_string(), "auth*".to_string()],
                uri_prefix: Some("/admin".to_string()),
                matching_strategy: Some(MatchingStrategy::All),
            },
            group("web", &["web"]),
        ];
        let filter = RouteFilter::new(&config, 1000.0).unwrap();

        assert_eq!(
            filter.categorize(&request("/admin/users", &["web", "auth:admin"])),
            Some("admin")
        );
        // Only one of two patterns matched
        assert_eq!(filter.categorize(&request("/admin/users", &["web"])), Some("web"));
        // Prefix mismatch
        assert_eq!(
            filter.categorize(&request("/users", &["web", "auth"])),
            Some("web")
        );
    }

    #[test]
    fn test_group_without_middleware_passes_on_prefix() {
        let mut config = overview();
        config.route_groups = vec![RouteGroupConfig {
            name: "docs".to_string(),
            middleware: vec![],
            uri_prefix: Some("/docs".to_string()),
            matching_strategy: None,
        }];
        let filter = RouteFilter::new(&config, 1000.0).unwrap();
        assert_eq!(filter.categorize(&request("/docs/intro", &[])), Some("docs"));
        assert_eq!(filter.categorize(&request("/blog", &[])), Some("other"));
    }

    #[test]
    fn test_middleware_exclusion_uses_wildcards() {
        let mut config = overview();
        config.exclude.middleware = vec!["internal*".to_string()];
        let filter = RouteFilter::new(&config, 1000.0).unwrap();
        assert!(filter.should_exclude(&request("/x", &["web", "internal:metrics"])));
        assert!(!filter.should_exclude(&request("/x", &["web"])));
    }

    #[test]
    fn test_filter_requests() {
        let filter = RouteFilter::new(&overview(), 1000.0).unwrap();
        let entries = vec![
            entry("1", "/a", &["api"], 10.0, 200),
            entry("2", "/b", &["web"], 20.0, 200),
            entry("3", "telescope/x", &["web"], 30.0, 200),
        ];

        let api = filter.filter_requests(entries.clone(), Some("api"));
        assert_eq!(api.len(), 1);
        assert_eq!(api[0].id, "1");

        let all = filter.filter_requests(entries, None);
        let ids: Vec<&str> = all.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
    }

    #[test]
    fn test_route_breakdown() {
        let filter = RouteFilter::new(&overview(), 1000.0).unwrap();
        let entries = vec![
            entry("1", "/a", &["api"], 100.0, 200),
            entry("2", "/b", &["api"], 200.0, 500),
            entry("3", "/c", &["api"], 300.0, 404),
            entry("4", "telescope/x", &["api"], 9000.0, 500),
            entry("5", "/d", &["custom"], 50.0, 200),
        ];

        let breakdown = filter.route_breakdown(&entries);
        let names: Vec<&str> = breakdown.iter().map(|s| s.name.as_str()).collect();
        // web has no requests and is omitted
        assert_eq!(names, vec!["api", "other"]);

        let api = &breakdown[0];
        assert_eq!(api.request_count, 3);
        assert_eq!(api.total_duration_ms, 600.0);
        assert_eq!(api.avg_response_time_ms, 200.0);
        assert_eq!(api.error_count, 2);
        assert_eq!(api.error_rate, 0.6667);
        assert_eq!(api.p95_response_time_ms, 300.0);
        assert!(api.exceeds_error_budget);

        let value = filter.route_breakdown_value(&entries);
        assert_eq!(value["other"]["request_count"], 1);
        assert_eq!(value["other"]["error_rate"], 0.0);
        assert_eq!(value["other"]["error_count"], 0);
        assert_eq!(value["other"]["total_duration_ms"], 50.0);
        assert!(value.get("web").is_none());
    }

    #[test]
    fn test_thresholds_fall_back() {
        let mut config = overview();
        config.thresholds.insert(
            "api".to_string(),
            RouteThresholdConfig {
                slow_request_ms: Some(250.0),
                acceptable_error_rate: None,
            },
        );
        let filter = RouteFilter::new(&config, 1000.0).unwrap();

        let api = filter.thresholds("api");
        assert_eq!(api.slow_request_ms, 250.0);
        assert_eq!(api.acceptable_error_rate, 0.05);

        let web = filter.thresholds("web");
        assert_eq!(web.slow_request_ms, 1000.0);
    }
}
