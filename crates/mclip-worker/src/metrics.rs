//! Run metrics.
//!
//! Recorded through the `metrics` facade; installing an exporter is left to
//! the embedding process.

use std::time::Duration;

use metrics::{counter, gauge, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Videos finished, by `status` (`ok` or `failed`).
    pub const VIDEOS_PROCESSED_TOTAL: &str = "mclip_videos_processed_total";

    /// Stage latency in seconds, by `stage`.
    pub const STAGE_DURATION_SECONDS: &str = "mclip_stage_duration_seconds";

    /// Candidates rejected by the filter, by `reason`.
    pub const CANDIDATES_DROPPED_TOTAL: &str = "mclip_candidates_dropped_total";

    /// Candidates scored locally after a provider failure, by `kind`.
    pub const SCORING_FALLBACK_TOTAL: &str = "mclip_scoring_fallback_total";

    /// Moments selected in the latest run.
    pub const MOMENTS_SELECTED: &str = "mclip_moments_selected";
}

pub fn record_video(success: bool) {
    let status = if success { "ok" } else { "failed" };
    counter!(names::VIDEOS_PROCESSED_TOTAL, "status" => status).increment(1);
}

pub fn record_stage(stage: &'static str, elapsed: Duration) {
    histogram!(names::STAGE_DURATION_SECONDS, "stage" => stage).record(elapsed.as_secs_f64());
}

pub fn record_drop(reason: &'static str) {
    counter!(names::CANDIDATES_DROPPED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_fallback(kind: &'static str) {
    counter!(names::SCORING_FALLBACK_TOTAL, "kind" => kind).increment(1);
}

pub fn record_selected(count: usize) {
    gauge!(names::MOMENTS_SELECTED).set(count as f64);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names() {
        assert!(names::VIDEOS_PROCESSED_TOTAL.ends_with("_total"));
        assert!(names::STAGE_DURATION_SECONDS.contains("seconds"));
        assert!(names::SCORING_FALLBACK_TOTAL.starts_with("mclip_"));
    }

    #[test]
    fn test_recording_without_exporter_is_noop() {
        record_video(true);
        record_stage("extract", Duration::from_millis(3));
        record_drop("too_short");
        record_fallback("auth");
        record_selected(4);
    }
}
