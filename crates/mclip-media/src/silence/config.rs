//! Configuration for silence detection.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::env_f64;

/// Configuration for [`SilenceDetector`](super::SilenceDetector).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SilenceConfig {
    /// dB levels to evaluate, in the order results are reported.
    pub thresholds_db: Vec<f64>,

    /// Shortest run that counts as silence (seconds).
    ///
    /// Filters out micro-pauses between words.
    pub min_silence_secs: f64,

    /// Silence share the recommended threshold should approach.
    pub target_ratio: f64,
}

impl Default for SilenceConfig {
    fn default() -> Self {
        Self {
            thresholds_db: vec![-30.0, -40.0, -50.0],
            min_silence_secs: 0.3,
            target_ratio: 0.20,
        }
    }
}

impl SilenceConfig {
    /// `MCLIP_SILENCE_THRESHOLDS` is a comma-separated dB list, e.g. `-30,-40,-50`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let thresholds_db = match std::env::var("MCLIP_SILENCE_THRESHOLDS") {
            Ok(raw) => match parse_thresholds(&raw) {
                Some(list) => list,
                None => {
                    warn!(value = %raw, "Invalid MCLIP_SILENCE_THRESHOLDS, using defaults");
                    defaults.thresholds_db.clone()
                }
            },
            Err(_) => defaults.thresholds_db.clone(),
        };

        Self {
            thresholds_db,
            min_silence_secs: env_f64("MCLIP_MIN_SILENCE_SECS", defaults.min_silence_secs).max(0.0),
            target_ratio: env_f64("MCLIP_TARGET_SILENCE_RATIO", defaults.target_ratio).clamp(0.0, 1.0),
        }
    }

    pub fn with_thresholds(mut self, thresholds_db: Vec<f64>) -> Self {
        self.thresholds_db = thresholds_db;
        self
    }

    pub fn with_min_silence_secs(mut self, secs: f64) -> Self {
        self.min_silence_secs = secs.max(0.0);
        self
    }

    pub fn with_target_ratio(mut self, ratio: f64) -> Self {
        self.target_ratio = ratio.clamp(0.0, 1.0);
        self
    }
}

fn parse_thresholds(raw: &str) -> Option<Vec<f64>> {
    let list: Option<Vec<f64>> = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect();
    list.filter(|l| !l.is_empty())
}
