//! Greedy non-overlapping selection of the highest-scoring moments.

use mclip_models::timestamp::TIME_EPSILON;
use mclip_models::{ScoredMoment, SelectionResult, SelectionShortfall};
use tracing::{debug, info, warn};

use crate::extractor::env_f64;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    pub target_count: usize,
    pub min_length: f64,
    pub max_length: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            target_count: 8,
            min_length: 15.0,
            max_length: 60.0,
        }
    }
}

impl SelectorConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            target_count: std::env::var("MCLIP_TARGET_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.target_count),
            min_length: env_f64("MCLIP_MIN_LENGTH_SECS", defaults.min_length),
            max_length: env_f64("MCLIP_MAX_LENGTH_SECS", defaults.max_length),
        }
    }

    pub fn with_target_count(mut self, target_count: usize) -> Self {
        self.target_count = target_count;
        self
    }

    pub fn with_lengths(mut self, min_length: f64, max_length: f64) -> Self {
        self.min_length = min_length;
        self.max_length = max_length;
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct MomentSelector {
    config: SelectorConfig,
}

impl MomentSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Highest score first, earlier start on ties; overlapping and
    /// out-of-range moments are skipped.
    pub fn select(&self, mut scored: Vec<ScoredMoment>) -> SelectionResult {
        let requested = self.config.target_count;
        scored.sort_by(|a, b| {
            b.composite_score
                .total_cmp(&a.composite_score)
                .then(a.start().total_cmp(&b.start()))
        });

        let mut accepted: Vec<ScoredMoment> = Vec::with_capacity(requested.min(scored.len()));
        for moment in scored {
            if accepted.len() >= requested {
                break;
            }

            let duration = moment.duration();
            if duration < self.config.min_length - TIME_EPSILON || duration > self.config.max_length + TIME_EPSILON {
                warn!(
                    start = moment.start(),
                    end = moment.end(),
                    duration = duration,
                    "Skipping moment outside length bounds"
                );
                continue;
            }

            if accepted.iter().any(|m| m.overlaps(&moment)) {
                debug!(start = moment.start(), end = moment.end(), "Skipping overlapping moment");
                continue;
            }

            accepted.push(moment);
        }

        let shortfall = (accepted.len() < requested).then(|| SelectionShortfall {
            requested,
            returned: accepted.len(),
        });
        if let Some(s) = &shortfall {
            warn!(requested = s.requested, returned = s.returned, "Selection shortfall");
        } else {
            info!(selected = accepted.len(), "Moments selected");
        }

        SelectionResult {
            moments: accepted,
            requested,
            shortfall,
        }
    }
}
