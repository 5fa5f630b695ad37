//! Categorical frequency counting
//!
//! Keys remember the order in which they were first seen, so ranking with a
//! stable sort breaks ties by first appearance.

use serde_json::{Map, Value};
use std::collections::HashMap;

/// Ordered key -> count table
#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: Vec<(String, u64)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count every key produced by an iterator
    pub fn from_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new();
        for key in keys {
            table.record(key);
        }
        table
    }

    pub fn record(&mut self, key: impl Into<String>) {
        let key = key.into();
        match self.index.get(&key) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    pub fn get(&self, key: &str) -> u64 {
        self.index
            .get(key)
            .map(|&slot| self.counts[slot].1)
            .unwrap_or(0)
    }

    /// Number of distinct keys
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(k, c)| (k.as_str(), *c))
    }

    /// Keys ranked by descending count, ties in first-seen order
    pub fn ranked(&self) -> Vec<(String, u64)> {
        let mut ranked = self.counts.clone();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    pub fn top(&self, n: usize) -> Vec<(String, u64)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    pub fn most_common(&self) -> Option<String> {
        self.ranked().into_iter().next().map(|(k, _)| k)
    }

    /// JSON object in first-seen order
    pub fn to_value(&self) -> Value {
        pairs_to_value(self.counts.iter().cloned())
    }

    /// JSON object of the `n` most frequent keys
    pub fn top_value(&self, n: usize) -> Value {
        pairs_to_value(self.top(n))
    }
}

fn pairs_to_value(pairs: impl IntoIterator<Item = (String, u64)>) -> Value {
    let map: Map<String, Value> = pairs
        .into_iter()
        .map(|(k, c)| (k, Value::from(c)))
        .collect();
    Value::Object(map)
}
