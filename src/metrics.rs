use metrics::{Counter, Histogram};
use std::time::Duration;

/// Capture pipeline counters, backed by the `metrics` facade. A recorder
/// installed by the embedding process picks these up; without one they are
/// no-ops.
pub struct Metrics {
    pub captures_taken: Counter,
    pub captures_failed: Counter,
    pub capture_duration: Histogram,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            captures_taken: metrics::register_counter!("pagesnap_captures_total"),
            captures_failed: metrics::register_counter!("pagesnap_captures_failed_total"),
            capture_duration: metrics::register_histogram!("pagesnap_capture_duration_seconds"),
        }
    }

    pub fn record_capture(&self, duration: Duration, success: bool) {
        if success {
            self.captures_taken.increment(1);
        } else {
            self.captures_failed.increment(1);
        }
        self.capture_duration.record(duration.as_secs_f64());
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
