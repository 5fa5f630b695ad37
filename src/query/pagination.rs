//! Offset pagination with advisory cursors
//!
//! Cursors are base64-encoded JSON `{value, timestamp}` tokens. They carry no
//! integrity guarantee; a cursor that fails to decode is simply ignored.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::PaginationConfig;

/// Decoded cursor payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    /// Offset the cursor points at
    pub value: i64,
    /// Unix seconds at which the cursor was issued
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageInfo {
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub has_more: bool,
    pub next_cursor: Option<String>,
    pub prev_cursor: Option<String>,
    pub current_page: usize,
    pub total_pages: usize,
}

/// One page of projected records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    pub data: Vec<Value>,
    pub pagination: PageInfo,
}

#[derive(Debug, Clone, Copy)]
pub struct PaginationManager {
    default_limit: i64,
    max_limit: i64,
}

impl PaginationManager {
    pub fn new(config: &PaginationConfig) -> Self {
        Self {
            default_limit: config.default_limit,
            max_limit: config.max_limit.max(1),
        }
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit as usize
    }

    /// Requested limit clamped to `[1, max_limit]`
    pub fn limit(&self, requested: Option<i64>) -> usize {
        requested
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit) as usize
    }

    /// Build page metadata around an already-sliced page of `data`
    pub fn paginate(
        &self,
        data: Vec<Value>,
        total: usize,
        limit: usize,
        offset: usize,
        issued_at: DateTime<Utc>,
    ) -> Page {
        let limit = limit.max(1);
        let has_more = offset + limit < total;

        let next_cursor = has_more.then(|| self.encode_cursor(offset + limit, issued_at));
        let prev_cursor =
            (offset > 0).then(|| self.encode_cursor(offset.saturating_sub(limit), issued_at));

        Page {
            data,
            pagination: PageInfo {
                total,
                limit,
                offset,
                has_more,
                next_cursor,
                prev_cursor,
                current_page: offset / limit + 1,
                total_pages: total.div_ceil(limit),
            },
        }
    }

    pub fn encode_cursor(&self, value: usize, issued_at: DateTime<Utc>) -> String {
        let cursor = Cursor {
            value: value as i64,
            timestamp: issued_at.timestamp(),
        };
        // Serializing two integers cannot fail
        let json = serde_json::to_vec(&cursor).unwrap_or_default();
        STANDARD.encode(json)
    }

    /// Decode a cursor; malformed input yields `None`
    pub fn decode_cursor(&self, cursor: &str) -> Option<Cursor> {
        let bytes = STANDARD.decode(cursor.trim()).ok()?;
        match serde_json::from_slice::<Value>(&bytes).ok()? {
            object @ Value::Object(_) => serde_json::from_value(object).ok(),
            _ => None,
        }
    }
}
