//! Response envelopes and field projection
//!
//! Every engine call produces an [`Envelope`]: a list of text blocks carrying
//! a pretty-printed JSON rendering of the payload, plus the structured payload
//! itself for callers that want to avoid re-parsing.

use serde::Serialize;
use serde_json::{json, Map, Value};

/// One text block of an envelope
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl TextContent {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: "text".to_string(),
            text: text.into(),
        }
    }
}

/// Uniform response wrapper handed to the transport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub content: Vec<TextContent>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,

    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl Envelope {
    /// Success envelope whose text is the pretty JSON of `payload`
    pub fn success(payload: Value) -> Self {
        Self {
            content: vec![TextContent::text(pretty(&payload))],
            data: Some(payload),
            is_error: false,
        }
    }

    /// Error envelope with text `Error: <message>`
    pub fn error(message: impl AsRef<str>, data: Value) -> Self {
        Self {
            content: vec![TextContent::text(format!("Error: {}", message.as_ref()))],
            data: Some(data),
            is_error: true,
        }
    }

    /// Text of the first content block
    pub fn text(&self) -> &str {
        self.content.first().map(|c| c.text.as_str()).unwrap_or("")
    }

    /// Serialized envelope as sent to the transport
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn pretty(payload: &Value) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string())
}

/// Shapes payloads into envelopes and projects list fields
#[derive(Debug, Clone, Copy, Default)]
pub struct ResponseFormatter;

impl ResponseFormatter {
    pub fn new() -> Self {
        Self
    }

    pub fn format(&self, payload: Value) -> Envelope {
        Envelope::success(payload)
    }

    pub fn format_summary(
        &self,
        total: usize,
        entry_type: &str,
        period: &str,
        stats: Value,
    ) -> Envelope {
        self.format(json!({
            "mode": "summary",
            "summary": {
                "total_count": total,
                "type": entry_type,
                "period": period,
            },
            "stats": stats,
        }))
    }

    pub fn format_detail(&self, entry: Value) -> Envelope {
        self.format(json!({ "entry": entry }))
    }

    pub fn format_stats(&self, stats: Value) -> Envelope {
        self.format(json!({ "statistics": stats }))
    }

    /// Project each normalized entry onto `fields`
    pub fn format_list(&self, entries: &[Value], fields: &[&str]) -> Vec<Value> {
        entries.iter().map(|entry| project(entry, fields)).collect()
    }
}

/// Flatten `entry` into a record keyed by the dotted `fields`
///
/// A missing path yields `null`; `id` is always present.
pub fn project(entry: &Value, fields: &[&str]) -> Value {
    let mut record = Map::new();
    for field in fields {
        record.insert((*field).to_string(), extract_field(entry, field));
    }

    if let Some(id) = entry.get("id").filter(|id| !id.is_null()) {
        record.insert("id".to_string(), id.clone());
    }

    Value::Object(record)
}

/// Walk a dotted path through objects (and arrays by index)
pub fn extract_field(entry: &Value, path: &str) -> Value {
    let mut current = entry;
    for key in path.split('.') {
        let next = match current {
            Value::Object(map) => map.get(key),
            Value::Array(items) => key.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        };

        match next {
            Some(value) if !value.is_null() => current = value,
            _ => return Value::Null,
        }
    }
    current.clone()
}
