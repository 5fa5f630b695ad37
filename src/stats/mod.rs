//! Statistics primitives shared by every entry tool
//!
//! - [`percentile`]: nearest-rank percentiles and numeric summaries
//! - [`frequency`]: ordered frequency tables with stable top-N ranking

pub mod frequency;
pub mod percentile;

// Re-export commonly used types
pub use frequency::FrequencyTable;
pub use percentile::{percentile, round_to, NumericSummary};
