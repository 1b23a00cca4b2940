//! Silence analysis models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A contiguous run below `threshold_db`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SilenceInterval {
    pub start: f64,
    pub end: f64,
    pub threshold_db: f64,
}

impl SilenceInterval {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

/// All silence intervals found at one threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdSilence {
    pub threshold_db: f64,
    pub intervals: Vec<SilenceInterval>,
}

impl ThresholdSilence {
    pub fn total_secs(&self) -> f64 {
        self.intervals.iter().map(SilenceInterval::duration).sum()
    }

    /// Share of `video_duration` that is silent.
    pub fn ratio(&self, video_duration: f64) -> f64 {
        if video_duration <= 0.0 {
            return 0.0;
        }
        self.total_secs() / video_duration
    }
}

/// Threshold chosen to best match a target silence ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ThresholdRecommendation {
    pub threshold_db: f64,
    pub ratio: f64,
    pub reason: String,
}
