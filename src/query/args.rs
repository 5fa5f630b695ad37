//! Request arguments and action dispatch
//!
//! Arguments arrive as a flat JSON mapping from the transport. Every key is
//! optional and numeric keys accept either JSON numbers or numeric strings.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::AppError;

/// Flat query argument mapping
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryArgs {
    pub action: Option<String>,
    pub period: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub limit: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub offset: Option<i64>,
    pub cursor: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub id: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub query: Option<String>,
    pub route_type: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub status: Option<i64>,
    pub method: Option<String>,
    #[serde(deserialize_with = "lenient_f64")]
    pub min_duration: Option<f64>,
    #[serde(deserialize_with = "lenient_f64")]
    pub min_time: Option<f64>,
    pub older_than: Option<String>,
    pub entry_type: Option<String>,
    #[serde(deserialize_with = "lenient_bool")]
    pub confirm: bool,
    pub level: Option<String>,
    pub connection: Option<String>,
    pub tag: Option<String>,
    pub family_hash: Option<String>,
    #[serde(deserialize_with = "lenient_i64")]
    pub before: Option<i64>,
}

impl QueryArgs {
    /// Parse a transport argument mapping; `null` means no arguments
    pub fn from_value(value: Value) -> Result<Self, AppError> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
            .map_err(|e| AppError::InvalidArgument(format!("Malformed arguments: {}", e)))
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    /// Requested offset, never negative
    pub fn offset(&self) -> usize {
        self.offset.unwrap_or(0).max(0) as usize
    }

    /// `route_type`, with `all` meaning no route filter
    pub fn route_filter(&self) -> Option<&str> {
        self.route_type.as_deref().filter(|r| *r != "all")
    }
}

fn lenient_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok().map(|f| f as i64),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_bool<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
        Some(Value::String(s)) => matches!(s.to_lowercase().as_str(), "true" | "1" | "yes"),
        _ => false,
    })
}

/// Query actions understood by entry tools
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Summary,
    List,
    Detail,
    Stats,
    Search,
    Slow,
    Duplicates,
    Failed,
    Prune,
}

impl Action {
    /// Absent or unrecognized actions fall back to `List`
    pub fn parse(action: Option<&str>) -> Self {
        match action {
            Some("summary") => Action::Summary,
            Some("detail") => Action::Detail,
            Some("stats") => Action::Stats,
            Some("search") => Action::Search,
            Some("slow") => Action::Slow,
            Some("duplicates") => Action::Duplicates,
            Some("failed") => Action::Failed,
            Some("prune") => Action::Prune,
            _ => Action::List,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Summary => "summary",
            Action::List => "list",
            Action::Detail => "detail",
            Action::Stats => "stats",
            Action::Search => "search",
            Action::Slow => "slow",
            Action::Duplicates => "duplicates",
            Action::Failed => "failed",
            Action::Prune => "prune",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
