//! Structured per-video run logging.
//!
//! Every event carries the video id and, where relevant, the stage name so a
//! single run can be followed through interleaved batch output.

use std::time::Duration;

use mclip_models::DroppedCandidate;
use mclip_moments::ScoringWarning;
use tracing::{debug, error, info, warn, Span};

/// Logs the lifecycle of one video run.
#[derive(Debug, Clone)]
pub struct RunLogger {
    video_id: String,
}

impl RunLogger {
    pub fn new(video_id: impl Into<String>) -> Self {
        Self {
            video_id: video_id.into(),
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    pub fn log_start(&self, message: &str) {
        info!(video_id = %self.video_id, "Run started: {}", message);
    }

    /// A stage finished; `items` is whatever the stage produced.
    pub fn log_stage(&self, stage: &str, elapsed: Duration, items: usize) {
        info!(
            video_id = %self.video_id,
            stage = stage,
            items = items,
            elapsed_ms = elapsed.as_millis() as u64,
            "Stage complete"
        );
    }

    pub fn log_complete(&self, selected: usize, elapsed: Duration) {
        info!(
            video_id = %self.video_id,
            selected = selected,
            elapsed_ms = elapsed.as_millis() as u64,
            "Run completed"
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(video_id = %self.video_id, "Run failed: {}", message);
    }

    pub fn log_fallback(&self, provider: &str, warning: &ScoringWarning) {
        warn!(
            video_id = %self.video_id,
            provider = provider,
            kind = warning.kind.as_str(),
            start = warning.start,
            end = warning.end,
            "Scored locally: {}", warning.message
        );
    }

    pub fn log_drop(&self, dropped: &DroppedCandidate) {
        debug!(
            video_id = %self.video_id,
            reason = dropped.reason.as_str(),
            start = dropped.start,
            end = dropped.end,
            "Candidate dropped"
        );
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!("video", video_id = %self.video_id)
    }
}
