use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::time::Duration;

/// Register metric descriptions with whatever recorder the host installed
///
/// Safe to call more than once. Without an installed recorder every
/// `record_*` call is a no-op.
pub fn describe_metrics() {
    describe_counter!(
        "entry_lens_tool_executions_total",
        "Total number of tool executions by outcome"
    );
    describe_histogram!(
        "entry_lens_tool_duration_seconds",
        "Tool execution duration in seconds"
    );
    describe_counter!(
        "entry_lens_entries_scanned_total",
        "Entries fetched from storage for query evaluation"
    );
    describe_counter!(
        "entry_lens_entries_deleted_total",
        "Entries removed by prune and clear operations"
    );
    describe_gauge!(
        "entry_lens_info",
        "Build information"
    );

    gauge!("entry_lens_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
}

/// Record one finished tool execution
pub fn record_execution(tool: &str, action: &str, outcome: &str, duration: Duration) {
    counter!(
        "entry_lens_tool_executions_total",
        "tool" => tool.to_string(),
        "action" => action.to_string(),
        "outcome" => outcome.to_string(),
    )
    .increment(1);

    histogram!(
        "entry_lens_tool_duration_seconds",
        "tool" => tool.to_string(),
        "action" => action.to_string(),
    )
    .record(duration.as_secs_f64());
}

/// Record entries fetched for one evaluation
pub fn record_entries_scanned(tool: &str, count: usize) {
    counter!(
        "entry_lens_entries_scanned_total",
        "tool" => tool.to_string(),
    )
    .increment(count as u64);
}

/// Record entries deleted by maintenance
pub fn record_entries_deleted(operation: &str, count: u64) {
    counter!(
        "entry_lens_entries_deleted_total",
        "operation" => operation.to_string(),
    )
    .increment(count);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_recorder_is_noop() {
        describe_metrics();
        record_execution("requests", "list", "success", Duration::from_millis(5));
        record_entries_scanned("requests", 10);
        record_entries_deleted("prune", 3);
    }
}
