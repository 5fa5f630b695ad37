//! Nearest-rank percentiles and numeric summaries
//!
//! Percentiles here are order statistics, not interpolated: the sample is
//! sorted ascending and the value at index `ceil(p/100 * n) - 1` (clamped to
//! the sample) is returned.

use serde::Serialize;

/// Calculate a percentile over a numeric sample
///
/// # Arguments
/// * `values` - Unsorted sample
/// * `percentile` - Percentile in the 0-100 range (e.g., 95.0 for P95)
///
/// # Returns
/// The nearest-rank value, or `0.0` for an empty sample
pub fn percentile(values: &[f64], percentile: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let rank = (percentile / 100.0 * n as f64).ceil() as i64 - 1;
    let index = rank.clamp(0, n as i64 - 1) as usize;

    sorted[index]
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Aggregate statistics over one numeric field
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct NumericSummary {
    pub count: usize,
    pub total: f64,
    pub avg: f64,
    pub min: f64,
    pub max: f64,
    pub p50: f64,
    pub p95: f64,
    pub p99: f64,
}

impl NumericSummary {
    /// Summarize a sample; an empty sample yields all zeros
    pub fn from_values(values: &[f64]) -> Self {
        if values.is_empty() {
            return Self::default();
        }

        let total: f64 = values.iter().sum();
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Self {
            count: values.len(),
            total,
            avg: total / values.len() as f64,
            min,
            max,
            p50: percentile(values, 50.0),
            p95: percentile(values, 95.0),
            p99: percentile(values, 99.0),
        }
    }
}
