//! Normalized telemetry entries
//!
//! An [`Entry`] is a read-only view of one stored record. Its `content` is an
//! open JSON mapping whose schema depends on the [`EntryType`]; every accessor
//! here is lenient and returns `None` (or an empty value) for absent or
//! malformed fields instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;

use crate::error::AppError;

/// Timestamp format used in normalized output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Monitoring category of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Request,
    Query,
    Job,
    Log,
    Exception,
    Cache,
    Event,
    Gate,
    Model,
    Notification,
    Redis,
    Schedule,
    View,
    Command,
}

impl EntryType {
    pub const ALL: [EntryType; 14] = [
        EntryType::Request,
        EntryType::Query,
        EntryType::Job,
        EntryType::Log,
        EntryType::Exception,
        EntryType::Cache,
        EntryType::Event,
        EntryType::Gate,
        EntryType::Model,
        EntryType::Notification,
        EntryType::Redis,
        EntryType::Schedule,
        EntryType::View,
        EntryType::Command,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryType::Request => "request",
            EntryType::Query => "query",
            EntryType::Job => "job",
            EntryType::Log => "log",
            EntryType::Exception => "exception",
            EntryType::Cache => "cache",
            EntryType::Event => "event",
            EntryType::Gate => "gate",
            EntryType::Model => "model",
            EntryType::Notification => "notification",
            EntryType::Redis => "redis",
            EntryType::Schedule => "schedule",
            EntryType::View => "view",
            EntryType::Command => "command",
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntryType::ALL
            .iter()
            .find(|t| t.as_str() == s.to_lowercase())
            .copied()
            .ok_or_else(|| AppError::InvalidArgument(format!("Unknown entry type: {}", s)))
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One normalized telemetry record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub id: String,

    #[serde(rename = "type")]
    pub entry_type: EntryType,

    /// Storage insertion order, used for `before` paging
    #[serde(default)]
    pub sequence: i64,

    #[serde(default)]
    pub family_hash: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: Map<String, Value>,

    pub created_at: DateTime<Utc>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    })
}

impl Entry {
    /// Build an entry from a JSON content value; non-object content becomes empty
    pub fn new(
        id: impl Into<String>,
        entry_type: EntryType,
        content: Value,
        created_at: DateTime<Utc>,
    ) -> Self {
        let content = match content {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        Self {
            id: id.into(),
            entry_type,
            sequence: 0,
            family_hash: None,
            tags: Vec::new(),
            content,
            created_at,
        }
    }

    /// Raw content field; JSON `null` counts as unset
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.content.get(key).filter(|v| !v.is_null())
    }

    /// Scalar content field rendered as a string
    pub fn content_str(&self, key: &str) -> Option<String> {
        self.field(key).and_then(scalar_string)
    }

    /// Numeric content field; numeric strings are accepted, anything else is `None`
    pub fn content_f64(&self, key: &str) -> Option<f64> {
        self.field(key).and_then(numeric_value)
    }

    /// Integer content field (floats are truncated)
    pub fn content_i64(&self, key: &str) -> Option<i64> {
        self.content_f64(key).map(|v| v as i64)
    }

    pub fn content_bool(&self, key: &str) -> bool {
        match self.field(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().map(|v| v != 0.0).unwrap_or(false),
            Some(Value::String(s)) => !s.is_empty() && s != "0",
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
            _ => false,
        }
    }

    /// List-valued content field; a single string becomes a one-element list
    pub fn content_strings(&self, key: &str) -> Vec<String> {
        match self.field(key) {
            Some(Value::Array(items)) => items.iter().filter_map(scalar_string).collect(),
            Some(Value::String(s)) => vec![s.clone()],
            _ => Vec::new(),
        }
    }

    pub fn created_at_string(&self) -> String {
        self.created_at.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Uniform `{id, content, created_at}` shape used by projections and search
    pub fn normalized(&self) -> Value {
        json!({
            "id": self.id,
            "content": self.content,
            "created_at": self.created_at_string(),
        })
    }

    /// Full record for detail views
    pub fn detail(&self) -> Value {
        json!({
            "id": self.id,
            "type": self.entry_type.as_str(),
            "sequence": self.sequence,
            "family_hash": self.family_hash,
            "tags": self.tags,
            "content": self.content,
            "created_at": self.created_at_string(),
        })
    }
}

/// Render a scalar JSON value as text; arrays and objects are JSON-encoded
pub fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1".to_string() } else { String::new() }),
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value).ok(),
    }
}

pub fn numeric_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

/// Typed view over a `request` entry's content
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestContent {
    pub uri: String,
    pub method: String,
    pub middleware: Vec<String>,
    pub controller_action: String,
    pub duration: f64,
    pub memory: f64,
    pub response_status: Option<i64>,
}

impl RequestContent {
    pub fn from_entry(entry: &Entry) -> Self {
        Self {
            uri: entry.content_str("uri").unwrap_or_default(),
            method: entry.content_str("method").unwrap_or_default(),
            middleware: entry.content_strings("middleware"),
            controller_action: entry.content_str("controller_action").unwrap_or_default(),
            duration: entry.content_f64("duration").unwrap_or(0.0),
            memory: entry.content_f64("memory").unwrap_or(0.0),
            response_status: entry.content_i64("response_status"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Entry {
        Entry::new(
            "e1",
            EntryType::Request,
            json!({
                "uri": "/api/users",
                "method": "GET",
                "middleware": ["api", "auth"],
                "duration": "125.5",
                "response_status": 404,
                "memory": null,
                "broadcast": true,
            }),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        )
    }

    #[test]
    fn test_entry_type_parse() {
        assert_eq!("query".parse::<EntryType>().unwrap(), EntryType::Query);
        assert_eq!("Request".parse::<EntryType>().unwrap(), EntryType::Request);
        assert!("mail".parse::<EntryType>().is_err());
    }

    #[test]
    fn test_lenient_accessors() {
        let entry = sample();
        assert_eq!(entry.content_f64("duration"), Some(125.5));
        assert_eq!(entry.content_i64("response_status"), Some(404));
        assert_eq!(entry.content_f64("memory"), None);
        assert_eq!(entry.content_f64("uri"), None);
        assert_eq!(entry.content_str("missing"), None);
        assert!(entry.content_bool("broadcast"));
        assert_eq!(entry.content_strings("middleware"), vec!["api", "auth"]);
    }

    #[test]
    fn test_null_content_deserializes_empty() {
        let entry: Entry = serde_json::from_value(json!({
            "id": "x",
            "type": "log",
            "content": null,
            "created_at": "2024-01-01T00:00:00Z",
        }))
        .unwrap();
        assert!(entry.content.is_empty());
        assert_eq!(entry.created_at_string(), "2024-01-01 00:00:00");
    }

    #[test]
    fn test_request_content_defaults() {
        let empty = Entry::new("e2", EntryType::Request, json!({}), Utc::now());
        let request = RequestContent::from_entry(&empty);
        assert_eq!(request.uri, "");
        assert!(request.middleware.is_empty());
        assert_eq!(request.duration, 0.0);
        assert_eq!(request.response_status, None);

        let request = RequestContent::from_entry(&sample());
        assert_eq!(request.middleware, vec!["api", "auth"]);
        assert_eq!(request.duration, 125.5);
    }
}
