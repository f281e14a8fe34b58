//! Prometheus metrics recording.

use kural_core::storage::Database;
use metrics::{counter, gauge, histogram};
use std::time::Duration;

/// Records HTTP request metrics.
pub fn record_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Records one scorer process invocation by role and outcome.
pub fn record_scorer_invocation(role: &str, outcome: &str, duration: Duration) {
    let labels = [("role", role.to_string()), ("outcome", outcome.to_string())];
    counter!("kural_scorer_invocations_total", &labels).increment(1);
    histogram!("kural_scorer_duration_seconds", &labels).record(duration.as_secs_f64());
}

/// Records a resolver operation and how it ended.
pub fn record_resolution(operation: &str, outcome: &str) {
    counter!(
        "kural_resolutions_total",
        "operation" => operation.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Sets the per-collection record gauges.
pub fn update_collection_metrics(db: &Database) {
    for (name, count) in db.collection_counts() {
        gauge!("kural_records_total", "collection" => name).set(count as f64);
    }
}
