//! Timestamp formatting utilities.
//!
//! Moments are stored as fractional seconds; these helpers render them for
//! AI prompts, logs and reports.

/// Tolerance used when comparing timestamps.
pub const TIME_EPSILON: f64 = 1e-6;

/// Format seconds as a compact `MM:SS` clock, rounding down.
pub fn format_clock(total_secs: f64) -> String {
    let whole = total_secs.max(0.0).floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}

/// Render an interval as `[MM:SS - MM:SS]`.
pub fn format_range(start: f64, end: f64) -> String {
    format!("[{} - {}]", format_clock(start), format_clock(end))
}

/// True when `[a_start, a_end)` and `[b_start, b_end)` share any time.
pub fn intervals_overlap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> bool {
    a_start < b_end - TIME_EPSILON && b_start < a_end - TIME_EPSILON
}

/// Distance between two intervals; zero when they touch or overlap.
pub fn interval_gap(a_start: f64, a_end: f64, b_start: f64, b_end: f64) -> f64 {
    if b_start > a_end {
        b_start - a_end
    } else if a_start > b_end {
        a_start - b_end
    } else {
        0.0
    }
}
