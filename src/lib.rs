pub mod config;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod query;
pub mod stats;
pub mod storage;
pub mod tools;

pub use config::Config;
pub use entry::{Entry, EntryType};
pub use error::AppError;
pub use query::{Envelope, EntryQueryEngine, QueryArgs};
pub use storage::{EntryRepository, MemoryRepository, SqliteRepository};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing/logging
///
/// `RUST_LOG` wins over the configured level. This function can only be
/// called once per process.
pub fn init_tracing(logging: &config::LoggingConfig) {
    let filter = if logging.enabled {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    } else {
        EnvFilter::new("off")
    };

    let registry = tracing_subscriber::registry().with(filter);

    if logging.format == "json" {
        registry
            .with(fmt::layer().json().with_target(true).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
