//! Entry query core
//!
//! - `args` - request arguments and action dispatch
//! - `period` - relative time windows
//! - `pattern` - wildcard matching
//! - `pagination` - page slicing and cursors
//! - `formatter` - envelopes and field projection
//! - `route_filter` - route group classification
//! - `engine` - orchestration
//! - `maintenance` - storage statistics and cleanup

pub mod args;
pub mod engine;
pub mod formatter;
pub mod maintenance;
pub mod pagination;
pub mod pattern;
pub mod period;
pub mod route_filter;

pub use args::{Action, QueryArgs};
pub use engine::EntryQueryEngine;
pub use formatter::{Envelope, ResponseFormatter};
pub use maintenance::{MaintenanceAction, MaintenanceTool};
pub use pagination::{Cursor, Page, PageInfo, PaginationManager};
pub use pattern::WildcardPattern;
pub use period::Period;
pub use route_filter::{RouteFilter, RouteGroupStats, RouteThresholds};
